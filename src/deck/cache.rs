use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::store::KvStore;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    pub fn set(&self, ms: i64) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Time-stamped value cache over a [`KvStore`]. Each value lives under `key`
/// with its store time (epoch ms) under `{key}_time`.
#[derive(Clone)]
pub struct ExpiringCache {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl ExpiringCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Returns the cached value while it is younger than `ttl`, otherwise
    /// runs `fetcher` and stores what it returns. A failed fetch leaves the
    /// existing entry alone.
    pub fn get<T, F>(&self, key: &str, ttl: Duration, fetcher: F) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, FetchError>,
    {
        let now = self.clock.now_ms();
        if let Some(value) = self.fresh(key, ttl, now) {
            tracing::debug!(key, "cache hit");
            return Ok(value);
        }

        tracing::debug!(key, "cache miss, fetching");
        let value = fetcher()?;
        self.put(key, &value, now);
        Ok(value)
    }

    /// Cached value regardless of age.
    pub fn peek_stale<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        serde_json::from_str(&raw).ok()
    }

    pub fn invalidate(&self, key: &str) {
        for k in [key.to_string(), time_key(key)] {
            if let Err(e) = self.store.delete(&k) {
                tracing::warn!(key = %k, error = %e, "failed to drop cache entry");
            }
        }
    }

    fn fresh<T: DeserializeOwned>(&self, key: &str, ttl: Duration, now: i64) -> Option<T> {
        let stored_at: i64 = self.store.get(&time_key(key))?.trim().parse().ok()?;
        if now - stored_at >= ttl.as_millis() as i64 {
            return None;
        }
        self.peek_stale(key)
    }

    fn put<T: Serialize>(&self, key: &str, value: &T, now: i64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key, error = %e, "could not serialize cache value");
                return;
            }
        };
        // Caching is best effort; a write failure still hands back the fresh value.
        if let Err(e) = self
            .store
            .set(key, &json)
            .and_then(|_| self.store.set(&time_key(key), &now.to_string()))
        {
            tracing::warn!(key, error = %e, "could not write cache entry");
        }
    }
}

fn time_key(key: &str) -> String {
    format!("{key}_time")
}
