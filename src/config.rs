// ABOUTME: Optional TOML settings file and resolution of connection/transfer options
// ABOUTME: CLI flags take precedence over the settings file, which overrides built-in defaults

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_FILE_NAME: &str = "DynamoDBData.json";
pub const DEFAULT_PROFILE: &str = "default";
pub const DEFAULT_REGION: &str = "eu-west-2";
pub const DEFAULT_LOCAL_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 100;

/// Contents of a settings file, e.g.
///
/// ```toml
/// [connection]
/// profile = "staging"
/// region = "us-east-1"
/// local_endpoint = "http://localhost:8000"
///
/// [transfer]
/// progress_interval = 500
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub connection: ConnectionSettings,
    #[serde(default)]
    pub transfer: TransferSettings,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ConnectionSettings {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub local_endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TransferSettings {
    pub progress_interval: Option<u64>,
}

pub fn parse_settings(text: &str) -> Result<Settings> {
    toml::from_str(text).context("Failed to parse settings TOML")
}

pub fn load_settings_from_file(path: &Path) -> Result<Settings> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    parse_settings(&text).with_context(|| format!("Invalid settings file {}", path.display()))
}

/// Fully resolved options for building a store client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub profile: String,
    pub region: String,
    pub local_endpoint: Option<String>,
}

/// Connection options as supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub local: Option<String>,
}

impl ConnectionConfig {
    /// Merge CLI overrides with a settings file, warning about every defaulted value.
    pub fn resolve(overrides: ConnectionOverrides, settings: &ConnectionSettings) -> Self {
        let profile = overrides
            .profile
            .or_else(|| settings.profile.clone())
            .unwrap_or_else(|| {
                tracing::warn!("Profile option not supplied. Using the default profile");
                DEFAULT_PROFILE.to_string()
            });

        let region = overrides
            .region
            .or_else(|| settings.region.clone())
            .unwrap_or_else(|| {
                tracing::warn!(
                    "Region option not supplied. Using region {}",
                    DEFAULT_REGION
                );
                DEFAULT_REGION.to_string()
            });

        let local_endpoint = overrides
            .local
            .or_else(|| settings.local_endpoint.clone())
            .map(|value| {
                if value.eq_ignore_ascii_case("true") {
                    DEFAULT_LOCAL_ENDPOINT.to_string()
                } else {
                    value
                }
            });

        if local_endpoint.is_some() {
            tracing::warn!("Using local DynamoDB");
        }

        Self {
            profile,
            region,
            local_endpoint,
        }
    }
}

pub fn resolve_progress_interval(flag: Option<u64>, settings: &TransferSettings) -> u64 {
    flag.or(settings.progress_interval)
        .filter(|interval| *interval > 0)
        .unwrap_or(DEFAULT_PROGRESS_INTERVAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let settings = parse_settings(
            r#"
            [connection]
            profile = "staging"
            region = "us-east-1"
            local_endpoint = "http://localhost:8000"

            [transfer]
            progress_interval = 500
            "#,
        )
        .unwrap();

        assert_eq!(settings.connection.profile.as_deref(), Some("staging"));
        assert_eq!(settings.connection.region.as_deref(), Some("us-east-1"));
        assert_eq!(settings.transfer.progress_interval, Some(500));
    }

    #[test]
    fn test_parse_empty_settings() {
        assert_eq!(parse_settings("").unwrap(), Settings::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse_settings("[connection]\nprofle = \"typo\"\n").is_err());
    }

    #[test]
    fn test_cli_overrides_settings() {
        let settings = ConnectionSettings {
            profile: Some("from-file".to_string()),
            region: Some("us-west-1".to_string()),
            local_endpoint: None,
        };
        let overrides = ConnectionOverrides {
            profile: Some("from-cli".to_string()),
            region: None,
            local: None,
        };

        let config = ConnectionConfig::resolve(overrides, &settings);
        assert_eq!(config.profile, "from-cli");
        assert_eq!(config.region, "us-west-1");
        assert_eq!(config.local_endpoint, None);
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            ConnectionConfig::resolve(ConnectionOverrides::default(), &ConnectionSettings::default());
        assert_eq!(config.profile, DEFAULT_PROFILE);
        assert_eq!(config.region, DEFAULT_REGION);
    }

    #[test]
    fn test_local_true_means_default_endpoint() {
        let overrides = ConnectionOverrides {
            local: Some("TRUE".to_string()),
            ..Default::default()
        };
        let config = ConnectionConfig::resolve(overrides, &ConnectionSettings::default());
        assert_eq!(config.local_endpoint.as_deref(), Some(DEFAULT_LOCAL_ENDPOINT));
    }

    #[test]
    fn test_local_true_in_settings_means_default_endpoint() {
        let settings = ConnectionSettings {
            local_endpoint: Some("true".to_string()),
            ..Default::default()
        };
        let config = ConnectionConfig::resolve(ConnectionOverrides::default(), &settings);
        assert_eq!(config.local_endpoint.as_deref(), Some(DEFAULT_LOCAL_ENDPOINT));
    }

    #[test]
    fn test_progress_interval_resolution() {
        let settings = TransferSettings {
            progress_interval: Some(250),
        };
        assert_eq!(resolve_progress_interval(Some(10), &settings), 10);
        assert_eq!(resolve_progress_interval(None, &settings), 250);
        assert_eq!(
            resolve_progress_interval(Some(0), &TransferSettings::default()),
            DEFAULT_PROGRESS_INTERVAL
        );
    }
}
