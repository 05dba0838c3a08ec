use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};

use crate::session::quiz::PromptMode;

pub const MIN_PAGE_SIZE: usize = 1;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default, deserialize_with = "lenient_prompt_mode")]
    pub prompt_mode: PromptMode,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_topics_url")]
    pub topics_url: String,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub feedback_endpoint: Option<String>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_page_size() -> usize {
    10
}
fn default_theme() -> String {
    "catppuccin-mocha".to_string()
}
fn default_topics_url() -> String {
    "index.json".to_string()
}
fn default_cache_ttl_secs() -> u64 {
    300
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Accepts any spelling `PromptMode::from_str` does. Anything else falls back
/// to the default instead of failing the whole file.
fn lenient_prompt_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PromptMode, D::Error> {
    let raw = toml::Value::deserialize(deserializer)?;
    let mode = raw.as_str().and_then(|s| s.parse().ok());
    if mode.is_none() {
        tracing::warn!(value = %raw, "unknown prompt_mode, using default");
    }
    Ok(mode.unwrap_or_default())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            prompt_mode: PromptMode::default(),
            theme: default_theme(),
            topics_url: default_topics_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            feedback_endpoint: None,
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vocabr")
            .join("config.toml")
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Clamp out-of-range values and reset unknown names to defaults.
    /// Call after deserialization to handle stale keys from old configs.
    pub fn validate(&mut self, valid_themes: &[String]) {
        self.page_size = self.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        if !valid_themes.is_empty() && !valid_themes.contains(&self.theme) {
            self.theme = default_theme();
        }
        if self.topics_url.trim().is_empty() {
            self.topics_url = default_topics_url();
        }
        if self
            .feedback_endpoint
            .as_deref()
            .is_some_and(|e| e.trim().is_empty())
        {
            self.feedback_endpoint = None;
        }
        if !matches!(
            self.log_level.as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            self.log_level = default_log_level();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn themes() -> Vec<String> {
        vec!["catppuccin-mocha".to_string(), "gruvbox-dark".to_string()]
    }

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.prompt_mode, PromptMode::Random);
        assert_eq!(config.topics_url, "index.json");
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert!(config.feedback_endpoint.is_none());
    }

    #[test]
    fn test_config_partial_file() {
        let toml_str = r#"
page_size = 5
prompt_mode = "foreign"
feedback_endpoint = "https://example.com/api/send-email"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.page_size, 5);
        assert_eq!(config.prompt_mode, PromptMode::Foreign);
        assert_eq!(
            config.feedback_endpoint.as_deref(),
            Some("https://example.com/api/send-email")
        );
        assert_eq!(config.theme, "catppuccin-mocha");
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.page_size, deserialized.page_size);
        assert_eq!(config.prompt_mode, deserialized.prompt_mode);
        assert_eq!(config.topics_url, deserialized.topics_url);
    }

    #[test]
    fn test_unknown_prompt_mode_resets_and_keeps_other_fields() {
        let toml_str = r#"
page_size = 25
prompt_mode = "sideways"
theme = "gruvbox-dark"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.prompt_mode, PromptMode::Random);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.theme, "gruvbox-dark");

        let config: Config = toml::from_str("prompt_mode = 3").unwrap();
        assert_eq!(config.prompt_mode, PromptMode::Random);
    }

    #[test]
    fn test_prompt_mode_accepts_any_case_and_aliases() {
        let config: Config = toml::from_str(r#"prompt_mode = "Native""#).unwrap();
        assert_eq!(config.prompt_mode, PromptMode::Native);
        let config: Config = toml::from_str(r#"prompt_mode = "en""#).unwrap();
        assert_eq!(config.prompt_mode, PromptMode::Foreign);
    }

    #[test]
    fn test_load_from_missing_file_is_default_and_save_round_trips() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        assert_eq!(Config::load_from(&path).unwrap().page_size, 10);

        let config = Config {
            page_size: 7,
            prompt_mode: PromptMode::Foreign,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.page_size, 7);
        assert_eq!(loaded.prompt_mode, PromptMode::Foreign);
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config::default();
        config.page_size = 0;
        config.theme = "nonexistent".to_string();
        config.log_level = "loud".to_string();
        config.feedback_endpoint = Some("  ".to_string());
        config.validate(&themes());

        assert_eq!(config.page_size, 1);
        assert_eq!(config.theme, "catppuccin-mocha");
        assert_eq!(config.log_level, "info");
        assert!(config.feedback_endpoint.is_none());

        config.page_size = 5000;
        config.validate(&themes());
        assert_eq!(config.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_validate_keeps_known_theme() {
        let mut config = Config::default();
        config.theme = "gruvbox-dark".to_string();
        config.validate(&themes());
        assert_eq!(config.theme, "gruvbox-dark");
    }
}
