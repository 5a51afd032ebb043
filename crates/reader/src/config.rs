//! Reader configuration management

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How readings are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One human-readable line per reading
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReaderConfig {
    #[serde(default)]
    pub reader: ReaderSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderSettings {
    #[serde(default = "ReaderSettings::default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub output: OutputFormat,
    /// Number of readings to take (0 = until interrupted)
    #[serde(default = "ReaderSettings::default_count")]
    pub count: u64,
    /// Pause between readings in milliseconds
    #[serde(default)]
    pub interval_ms: u64,
}

impl ReaderSettings {
    fn default_log_level() -> String {
        "info".to_string()
    }

    fn default_count() -> u64 {
        1
    }
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            output: OutputFormat::default(),
            count: Self::default_count(),
            interval_ms: 0,
        }
    }
}

impl ReaderConfig {
    /// Load configuration from file
    ///
    /// With no explicit path, the default location is tried.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => {
                let default = Self::default_path();
                if !default.exists() {
                    return Err(anyhow!(
                        "No configuration file found at: {}",
                        default.display()
                    ));
                }
                default
            }
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: ReaderConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location, or return defaults if
    /// no file exists there
    ///
    /// A file that exists but cannot be read, parsed or validated is an error.
    pub fn load_or_default() -> Result<Self> {
        Self::load_or_default_from(Self::default_path())
    }

    fn load_or_default_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(Some(path))
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("dymo-scale").join("reader.toml")
        } else {
            PathBuf::from(".config/dymo-scale/reader.toml")
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        validate_log_level(&self.reader.log_level)
    }
}

pub fn validate_log_level(level: &str) -> Result<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&level) {
        return Err(anyhow!(
            "Invalid log level '{}', must be one of: {}",
            level,
            valid_levels.join(", ")
        ));
    }
    Ok(())
}

/// Expand `~` in a user-supplied config path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReaderConfig::default();
        assert_eq!(config.reader.log_level, "info");
        assert_eq!(config.reader.output, OutputFormat::Text);
        assert_eq!(config.reader.count, 1);
        assert_eq!(config.reader.interval_ms, 0);
    }

    #[test]
    fn test_config_serialization() {
        let config = ReaderConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: ReaderConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.reader.log_level, parsed.reader.log_level);
        assert_eq!(config.reader.output, parsed.reader.output);
        assert_eq!(config.reader.count, parsed.reader.count);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: ReaderConfig = toml::from_str(
            r#"
[reader]
output = "json"
"#,
        )
        .unwrap();
        assert_eq!(parsed.reader.output, OutputFormat::Json);
        assert_eq!(parsed.reader.log_level, "info");
        assert_eq!(parsed.reader.count, 1);

        let empty: ReaderConfig = toml::from_str("").unwrap();
        assert_eq!(empty.reader.count, 1);
    }

    #[test]
    fn test_unknown_output_rejected() {
        let parsed: std::result::Result<ReaderConfig, _> = toml::from_str(
            r#"
[reader]
output = "xml"
"#,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = ReaderConfig::default();
        assert!(config.validate().is_ok());

        config.reader.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.reader.log_level = "trace".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("reader.toml");

        let mut config = ReaderConfig::default();
        config.reader.output = OutputFormat::Json;
        config.reader.count = 0;
        config.reader.interval_ms = 250;
        config.save(&path).unwrap();

        let loaded = ReaderConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.reader.output, OutputFormat::Json);
        assert_eq!(loaded.reader.count, 0);
        assert_eq!(loaded.reader.interval_ms, 250);
    }

    #[test]
    fn test_load_rejects_invalid_log_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        fs::write(&path, "[reader]\nlog_level = \"loud\"\n").unwrap();

        let err = ReaderConfig::load(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ReaderConfig::load(Some(dir.path().join("absent.toml"))).is_err());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReaderConfig::load_or_default_from(dir.path().join("reader.toml")).unwrap();
        assert_eq!(config.reader.log_level, "info");
        assert_eq!(config.reader.count, 1);
    }

    #[test]
    fn test_load_or_default_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        fs::write(&path, "[reader\ncount = ").unwrap();

        let err = ReaderConfig::load_or_default_from(path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_or_default_reports_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        fs::write(&path, "[reader]\nlog_level = \"chatty\"\n").unwrap();

        let err = ReaderConfig::load_or_default_from(path).unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_load_or_default_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reader.toml");
        fs::write(&path, "[reader]\ncount = 3\n").unwrap();

        let config = ReaderConfig::load_or_default_from(path).unwrap();
        assert_eq!(config.reader.count, 3);
    }

    #[test]
    fn test_expand_path_without_tilde() {
        assert_eq!(
            expand_path("/etc/dymo-scale/reader.toml"),
            PathBuf::from("/etc/dymo-scale/reader.toml")
        );
    }
}
