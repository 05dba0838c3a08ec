use std::time::Duration;

use crate::deck::cache::ExpiringCache;
use crate::deck::card::{FlashcardRecord, parse_deck};
use crate::deck::source::fetch_text;
use crate::deck::topic::{Topic, parse_manifest};
use crate::error::FetchError;

pub const TOPICS_KEY: &str = "topics";
pub const UPLOADED_DECK_KEY: &str = "flashcards";

/// What a load produced. `warning` is set when fresh data could not be
/// fetched and a stale cached copy was used instead.
#[derive(Debug)]
pub struct Loaded<T> {
    pub value: T,
    pub warning: Option<String>,
}

pub fn deck_key(url: &str) -> String {
    format!("{UPLOADED_DECK_KEY}:{url}")
}

pub fn load_topics(
    cache: &ExpiringCache,
    url: &str,
    ttl: Duration,
) -> Result<Loaded<Vec<Topic>>, FetchError> {
    load_with_fallback(cache, TOPICS_KEY, ttl, || {
        let raw = fetch_text(url)?;
        Ok(parse_manifest(&raw)?)
    })
}

pub fn load_topic_cards(
    cache: &ExpiringCache,
    url: &str,
    ttl: Duration,
) -> Result<Loaded<Vec<FlashcardRecord>>, FetchError> {
    load_with_fallback(cache, &deck_key(url), ttl, || {
        let raw = fetch_text(url)?;
        Ok(parse_deck(&raw)?)
    })
}

fn load_with_fallback<T, F>(
    cache: &ExpiringCache,
    key: &str,
    ttl: Duration,
    fetcher: F,
) -> Result<Loaded<T>, FetchError>
where
    T: serde::Serialize + serde::de::DeserializeOwned,
    F: FnOnce() -> Result<T, FetchError>,
{
    match cache.get(key, ttl, fetcher) {
        Ok(value) => Ok(Loaded {
            value,
            warning: None,
        }),
        Err(e) => match cache.peek_stale(key) {
            Some(value) => {
                tracing::warn!(key, error = %e, "refresh failed, serving stale copy");
                Ok(Loaded {
                    value,
                    warning: Some(format!("Showing cached data: {e}")),
                })
            }
            None => {
                tracing::error!(key, error = %e, "load failed");
                Err(e)
            }
        },
    }
}
