use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use basket_core::CoreConfig;
use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = "basket";
const CONFIG_FILE: &str = "config.json";

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Server root, e.g. http://localhost:8000
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Household access key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Delay before reconnecting the update stream
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_ms: Option<u64>,
}

impl CliConfig {
    /// `<config dir>/basket/config.json`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Like `load`, but a missing file is an empty config
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config dir: {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize config")
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize config")
    }

    /// Core settings, with `base_url` taking precedence over the file.
    pub fn core_config(&self, base_url: Option<&str>) -> CoreConfig {
        let mut config = match base_url.or(self.base_url.as_deref()) {
            Some(url) => CoreConfig::new(url),
            None => CoreConfig::default(),
        };
        if let Some(ms) = self.reconnect_delay_ms {
            config = config.with_reconnect_delay(Duration::from_millis(ms));
        }
        config
    }

    /// Stored key, ignoring blank values
    pub fn stored_key(&self) -> Option<&str> {
        self.access_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_full() {
        let json = r#"{
            "baseUrl": "http://pantry.local:8000",
            "accessKey": "secret",
            "reconnectDelayMs": 500
        }"#;
        let config = CliConfig::from_json(json).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("http://pantry.local:8000"));
        assert_eq!(config.stored_key(), Some("secret"));

        let core = config.core_config(None);
        assert_eq!(core.base_url, "http://pantry.local:8000");
        assert_eq!(core.reconnect_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_config_minimal() {
        let config = CliConfig::from_json("{}").unwrap();
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.core_config(None).base_url, "http://localhost:8000");
    }

    #[test]
    fn test_flag_overrides_file_base_url() {
        let config = CliConfig {
            base_url: Some("http://from-file:1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.core_config(Some("http://from-flag:2/")).base_url,
            "http://from-flag:2"
        );
    }

    #[test]
    fn test_blank_key_is_not_a_key() {
        let config = CliConfig {
            access_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.stored_key(), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        assert_eq!(CliConfig::load_or_default(&path).unwrap(), CliConfig::default());

        let config = CliConfig {
            access_key: Some("k".to_string()),
            ..Default::default()
        };
        config.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"accessKey\""));
        assert!(!raw.contains("baseUrl"));
        assert_eq!(CliConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = CliConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
