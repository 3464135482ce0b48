//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/eventslot/config.toml` by default:
//!
//! ```toml
//! debug = false
//!
//! [display]
//! format = "table"          # or "json"
//! zone = "Europe/Paris"     # render timed slots in this zone
//! limit = 20
//! date_format = "%a %Y-%m-%d %H:%M"
//! ```
//!
//! Command-line flags take precedence over these values.

use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use eventslot_core::time::parse_zone;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Configuration for the eventslot client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug logging, same as `--debug`.
    pub debug: bool,

    #[serde(default)]
    pub display: DisplaySettings,
}

/// How expanded slots are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Display settings for expansion output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub format: OutputFormat,

    /// IANA zone timed slots are rendered in; each slot's own zone if unset.
    pub zone: Option<String>,

    /// Maximum number of slots to print.
    pub limit: Option<usize>,

    /// chrono format string for timed slots in table output.
    pub date_format: String,
}

pub const DEFAULT_DATE_FORMAT: &str = "%a %Y-%m-%d %H:%M";

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Table,
            zone: None,
            limit: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl DisplaySettings {
    /// Parses the configured display zone.
    pub fn zone(&self) -> ClientResult<Option<Tz>> {
        self.zone
            .as_deref()
            .map(parse_zone)
            .transpose()
            .map_err(|e| ClientError::config(format!("display.zone: {e}")))
    }
}

/// Rejects blank strings and strftime specifiers chrono cannot format.
pub fn check_date_format(format: &str) -> ClientResult<()> {
    if format.trim().is_empty() {
        return Err(ClientError::config("display.date_format must not be empty"));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ClientError::config(format!(
            "display.date_format {format:?} is not a valid strftime format"
        )));
    }
    Ok(())
}

impl ClientConfig {
    /// Loads configuration from the default path, or defaults if the file
    /// does not exist.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ClientError::io(path, e))?;
        toml::from_str(&content).map_err(|e| {
            ClientError::config(format!("failed to parse {}: {e}", path.display()))
        })
    }

    /// Checks values that parse but cannot be used.
    pub fn validate(&self) -> ClientResult<()> {
        self.display.zone()?;
        if self.display.limit == Some(0) {
            return Err(ClientError::config("display.limit must be at least 1"));
        }
        check_date_format(&self.display.date_format)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eventslot")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.display.date_format, DEFAULT_DATE_FORMAT);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn display_section() {
        let config: ClientConfig = toml::from_str(
            r#"
debug = true

[display]
format = "json"
zone = "Europe/Paris"
limit = 5
"#,
        )
        .unwrap();
        assert!(config.debug);
        assert_eq!(config.display.format, OutputFormat::Json);
        assert_eq!(config.display.zone().unwrap(), Some(chrono_tz::Europe::Paris));
        assert_eq!(config.display.limit, Some(5));
        assert_eq!(config.display.date_format, DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn validate_rejects_unknown_zone() {
        let mut config = ClientConfig::default();
        config.display.zone = Some("Atlantis/Central".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("display.zone"));
    }

    #[test]
    fn validate_rejects_zero_limit() {
        let mut config = ClientConfig::default();
        config.display.limit = Some(0);
        assert!(matches!(config.validate(), Err(ClientError::Config(_))));
    }

    #[test]
    fn validate_rejects_unknown_specifier() {
        let config: ClientConfig = toml::from_str("[display]\ndate_format = \"%Q\"\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("%Q"), "{err}");

        assert!(check_date_format("%Y-%m-%d %H:%M %%").is_ok());
        assert!(check_date_format("%a %e %b").is_ok());
        assert!(check_date_format("%").is_err());
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[display]\nlimit = 3\n").unwrap();

        let config = ClientConfig::load_from(&path).unwrap();
        assert_eq!(config.display.limit, Some(3));
    }

    #[test]
    fn load_from_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = ClientConfig::load_from(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ClientError::Io { .. }));
    }

    #[test]
    fn load_from_malformed_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[display\n").unwrap();
        assert!(matches!(
            ClientConfig::load_from(&path),
            Err(ClientError::Config(_))
        ));
    }

    #[test]
    fn dump_round_trip() {
        let mut config = ClientConfig::default();
        config.display.zone = Some("Asia/Tokyo".to_string());
        let text = toml::to_string_pretty(&config).unwrap();
        let back: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        let path = ClientConfig::default_path();
        assert!(path.ends_with("eventslot/config.toml"));
    }
}
