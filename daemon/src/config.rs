//! Daemon configuration with TOML file support.

use serde::{Deserialize, Serialize};
use statkit_types::{StatCurve, StatError};
use statkit_utils::LogFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Configuration for the statkit daemon.
///
/// Loaded from a TOML file via [`DaemonConfig::from_toml_file`]; every field
/// is optional and CLI flags override whatever the file says.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Root of the stat and player data.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Curve weight for stats registered without an explicit `--weight`.
    #[serde(default = "default_weight")]
    pub default_weight: i64,

    /// Curve max level for stats registered without an explicit `--max`.
    #[serde(default = "default_max")]
    pub default_max: i32,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./stat_data")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_weight() -> i64 {
    StatCurve::DEFAULT_WEIGHT
}

fn default_max() -> i32 {
    StatCurve::DEFAULT_MAX
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Curve for a newly registered stat, with any unset parameter taken
    /// from the configured defaults.
    pub fn curve(
        &self,
        default: Option<i64>,
        random: Option<i64>,
        max: Option<i32>,
        weight: Option<i64>,
    ) -> Result<StatCurve, StatError> {
        StatCurve::new(
            default.unwrap_or(0),
            random.unwrap_or(0),
            max.unwrap_or(self.default_max),
            weight.unwrap_or(self.default_weight),
        )
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            default_weight: default_weight(),
            default_max: default_max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = DaemonConfig::from_toml_str("").unwrap();
        assert_eq!(config, DaemonConfig::default());
        assert_eq!(config.data_dir, PathBuf::from("./stat_data"));
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.default_weight, 2);
        assert_eq!(config.default_max, 1);
    }

    #[test]
    fn partial_toml_overrides_fields() {
        let config = DaemonConfig::from_toml_str(
            r#"
            data_dir = "/var/lib/statkit"
            log_format = "json"
            default_max = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/statkit"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.default_max, 10);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(matches!(
            DaemonConfig::from_toml_str(r#"log_format = "xml""#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn toml_roundtrip() {
        let config = DaemonConfig {
            default_weight: 3,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(DaemonConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn reads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();
        let config = DaemonConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            DaemonConfig::from_toml_file(&dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn curve_fills_unset_parameters() {
        let config = DaemonConfig {
            default_max: 3,
            ..Default::default()
        };
        let curve = config.curve(None, None, None, None).unwrap();
        assert_eq!(curve.levels(), &[1, 2, 4, 8]);
        let curve = config.curve(Some(5), Some(2), Some(2), Some(10)).unwrap();
        assert_eq!(curve.default_value(), 5);
        assert_eq!(curve.levels(), &[1, 10, 100]);
    }
}
