use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;

use crate::store::KvStore;
use crate::store::schema::QuizHistoryData;

const HISTORY_FILE: &str = "history.json";
const CACHE_DIR: &str = "cache";

/// File-backed storage under the user's data directory. Cache entries are
/// one file per key in `cache/`; quiz history is a single versioned file.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vocabr");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(base_dir.join(CACHE_DIR))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn cache_path(&self, key: &str) -> PathBuf {
        self.base_dir
            .join(CACHE_DIR)
            .join(format!("{}.json", sanitize_key(key)))
    }

    /// Write to a sibling `.tmp` file, then rename over the target.
    fn write_atomic(path: &PathBuf, content: &str) -> Result<()> {
        let tmp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Missing, unreadable, or outdated history starts over empty.
    pub fn load_history(&self) -> QuizHistoryData {
        let path = self.file_path(HISTORY_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return QuizHistoryData::default();
        };
        match serde_json::from_str::<QuizHistoryData>(&content) {
            Ok(data) if !data.needs_reset() => data,
            Ok(data) => {
                tracing::warn!(
                    found = data.schema_version,
                    "history schema changed, starting fresh"
                );
                QuizHistoryData::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "history file unreadable, starting fresh");
                QuizHistoryData::default()
            }
        }
    }

    pub fn save_history(&self, data: &QuizHistoryData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        Self::write_atomic(&self.file_path(HISTORY_FILE), &json)
    }
}

impl KvStore for JsonStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.cache_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        Self::write_atomic(&self.cache_path(key), value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.cache_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Percent-encodes every byte outside `[A-Za-z0-9.-]`, so distinct keys
/// always map to distinct file names.
fn sanitize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}
