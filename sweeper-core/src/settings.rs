use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;
use twilight_model::id::{Id, marker::ChannelMarker};

pub const DEFAULT_CONFIG_PATH: &str = "bot_config.json";
pub const DEFAULT_CLEANUP_INTERVAL_HOURS: u64 = 24;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum SettingsError {
    #[error("DISCORD_TOKEN is not set")]
    MissingToken,
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration read from the environment at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub token: String,
    /// Channel that receives scheduled cleanup reports.
    pub log_channel_id: Option<Id<ChannelMarker>>,
    pub config_path: PathBuf,
    pub cleanup_interval: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let token = lookup("DISCORD_TOKEN")
            .map(|token| token.trim().to_owned())
            .filter(|token| !token.is_empty())
            .ok_or(SettingsError::MissingToken)?;

        let log_channel_id = match non_empty(lookup("LOG_CHANNEL_ID")) {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .ok()
                    .and_then(Id::new_checked)
                    .ok_or(SettingsError::Invalid {
                        name: "LOG_CHANNEL_ID",
                        value: raw,
                    })?,
            ),
            None => None,
        };

        let config_path = non_empty(lookup("SWEEPER_CONFIG_PATH"))
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);

        let interval_hours = match non_empty(lookup("CLEANUP_INTERVAL_HOURS")) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or(SettingsError::Invalid {
                    name: "CLEANUP_INTERVAL_HOURS",
                    value: raw,
                })?,
            None => DEFAULT_CLEANUP_INTERVAL_HOURS,
        };

        Ok(Self {
            token,
            log_channel_id,
            config_path,
            cleanup_interval: Duration::from_secs(interval_hours * 60 * 60),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn token_is_required() {
        assert_eq!(settings(&[]).unwrap_err(), SettingsError::MissingToken);
        assert_eq!(
            settings(&[("DISCORD_TOKEN", "  ")]).unwrap_err(),
            SettingsError::MissingToken
        );
    }

    #[test]
    fn defaults_apply() {
        let settings = settings(&[("DISCORD_TOKEN", "abc")]).unwrap();
        assert_eq!(settings.token, "abc");
        assert_eq!(settings.log_channel_id, None);
        assert_eq!(settings.config_path, PathBuf::from(DEFAULT_CONFIG_PATH));
        assert_eq!(settings.cleanup_interval, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn optional_values_are_parsed() {
        let settings = settings(&[
            ("DISCORD_TOKEN", "abc"),
            ("LOG_CHANNEL_ID", "555"),
            ("SWEEPER_CONFIG_PATH", "/tmp/sweeper.json"),
            ("CLEANUP_INTERVAL_HOURS", "6"),
        ])
        .unwrap();
        assert_eq!(settings.log_channel_id, Some(Id::new(555)));
        assert_eq!(settings.config_path, PathBuf::from("/tmp/sweeper.json"));
        assert_eq!(settings.cleanup_interval, Duration::from_secs(6 * 60 * 60));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            settings(&[("DISCORD_TOKEN", "abc"), ("LOG_CHANNEL_ID", "general")]),
            Err(SettingsError::Invalid { name: "LOG_CHANNEL_ID", .. })
        ));
        assert!(matches!(
            settings(&[("DISCORD_TOKEN", "abc"), ("CLEANUP_INTERVAL_HOURS", "0")]),
            Err(SettingsError::Invalid { name: "CLEANUP_INTERVAL_HOURS", .. })
        ));
    }
}
