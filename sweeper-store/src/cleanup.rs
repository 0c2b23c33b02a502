use std::{collections::BTreeMap, fs, io, path::Path};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Age threshold applied when `autocleanup` is given no explicit day count.
pub const DEFAULT_AGE_DAYS: u32 = 7;

/// One channel configured for scheduled cleanup.
///
/// The channel id is the key of [`CleanupConfig::entries`]; the name is a display
/// cache captured when the entry was created and may go stale.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CleanupEntry {
    pub channel_name: String,
    #[serde(rename = "days")]
    pub age_days: u32,
    pub guild_id: u64,
}

/// The whole persisted document.
///
/// `enabled` is expected to be true exactly when `entries` is non-empty, but only
/// the store's own mutations keep it that way; a hand-edited file is trusted as
/// given.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    #[serde(rename = "auto_cleanup")]
    pub entries: BTreeMap<u64, CleanupEntry>,
    #[serde(rename = "cleanup_age_days")]
    pub default_age_days: u32,
    #[serde(rename = "cleanup_enabled")]
    pub enabled: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            default_age_days: DEFAULT_AGE_DAYS,
            enabled: false,
        }
    }
}

impl CleanupConfig {
    /// Whether `enabled` disagrees with the entry set.
    pub fn is_inconsistent(&self) -> bool {
        self.enabled == self.entries.is_empty()
    }
}

/// Load the document at `path`, falling back to the default on any failure.
pub fn load_config(path: &Path) -> CleanupConfig {
    config_from_read(path, fs::read(path))
}

/// [`load_config`] without blocking the runtime.
pub async fn read_config(path: &Path) -> CleanupConfig {
    config_from_read(path, tokio::fs::read(path).await)
}

fn config_from_read(path: &Path, read: io::Result<Vec<u8>>) -> CleanupConfig {
    let raw = match read {
        Ok(raw) => raw,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            return CleanupConfig::default();
        }
        Err(source) => {
            warn!(?source, path = %path.display(), "config file unreadable, using defaults");
            return CleanupConfig::default();
        }
    };

    match decode_config(&raw) {
        Ok(config) => {
            if config.is_inconsistent() {
                warn!(
                    path = %path.display(),
                    enabled = config.enabled,
                    entries = config.entries.len(),
                    "cleanup_enabled does not match the configured channels"
                );
            }
            config
        }
        Err(source) => {
            warn!(?source, path = %path.display(), "config file malformed, using defaults");
            CleanupConfig::default()
        }
    }
}

/// Overwrite `path` with the full document.
pub fn save_config(path: &Path, config: &CleanupConfig) -> io::Result<()> {
    fs::write(path, encode_config(config)?)
}

pub fn decode_config(raw: &[u8]) -> serde_json::Result<CleanupConfig> {
    serde_json::from_slice(raw)
}

/// Two-space indented JSON with sorted channel keys.
pub fn encode_config(config: &CleanupConfig) -> io::Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CleanupConfig {
        let mut config = CleanupConfig::default();
        config.entries.insert(
            123,
            CleanupEntry {
                channel_name: "general".to_owned(),
                age_days: 7,
                guild_id: 1,
            },
        );
        config.enabled = true;
        config
    }

    #[test]
    fn missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.json"));
        assert_eq!(config, CleanupConfig::default());
        assert_eq!(config.default_age_days, 7);
        assert!(!config.enabled);
    }

    #[test]
    fn malformed_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot_config.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(load_config(&path), CleanupConfig::default());
    }

    #[test]
    fn reads_the_legacy_layout() {
        let raw = br#"{
            "auto_cleanup": {"123": {"channel_name": "general", "days": 3, "guild_id": 9}},
            "cleanup_age_days": 7,
            "cleanup_enabled": true
        }"#;
        let config = decode_config(raw).unwrap();
        assert!(config.enabled);
        assert_eq!(config.entries[&123].age_days, 3);
        assert_eq!(config.entries[&123].guild_id, 9);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config = decode_config(br#"{"auto_cleanup": {}}"#).unwrap();
        assert_eq!(config, CleanupConfig::default());
    }

    #[test]
    fn save_of_load_is_byte_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bot_config.json");
        save_config(&path, &sample()).unwrap();
        let first = fs::read(&path).unwrap();

        save_config(&path, &load_config(&path)).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(load_config(&path), sample());
    }

    #[test]
    fn detects_enabled_without_entries() {
        let config = CleanupConfig {
            enabled: true,
            ..CleanupConfig::default()
        };
        assert!(config.is_inconsistent());
        assert!(!sample().is_inconsistent());
        assert!(!CleanupConfig::default().is_inconsistent());
    }
}
