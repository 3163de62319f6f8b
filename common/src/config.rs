// Configuration management with layered configuration (file, env)

use crate::schedule::parse_timezone;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub backend: BackendConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub api_token: Option<String>,
}

fn default_timeout_seconds() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// IANA timezone the daily trigger time is interpreted in
    pub timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let defaults = Settings::default();

        let builder = Config::builder()
            // Built-in defaults so an empty config directory still works
            .set_default("backend.base_url", defaults.backend.base_url)?
            .set_default("backend.timeout_seconds", defaults.backend.timeout_seconds as i64)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("MDM")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        let url = self.backend.base_url.trim();
        if url.is_empty() {
            return Err("Backend base_url cannot be empty".to_string());
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("Backend base_url must be an http(s) URL: {}", url));
        }
        if self.backend.timeout_seconds == 0 {
            return Err("Backend timeout_seconds must be greater than 0".to_string());
        }

        parse_timezone(&self.schedule.timezone).map_err(|e| e.to_string())?;

        if self.observability.log_level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://localhost:8080/api/mdm".to_string(),
                timeout_seconds: default_timeout_seconds(),
                api_token: None,
            },
            schedule: ScheduleConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_catches_empty_base_url() {
        let mut settings = Settings::default();
        settings.backend.base_url = String::new();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_non_http_url() {
        let mut settings = Settings::default();
        settings.backend.base_url = "ftp://example.com".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_timeout() {
        let mut settings = Settings::default();
        settings.backend.timeout_seconds = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_catches_unknown_timezone() {
        let mut settings = Settings::default();
        settings.schedule.timezone = "Nowhere/Special".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            r#"
[backend]
base_url = "https://mdm.example.com/api"
timeout_seconds = 10
api_token = "secret"

[schedule]
timezone = "Asia/Ho_Chi_Minh"

[observability]
log_level = "debug"
log_format = "json"
"#,
        )
        .unwrap();

        let settings = Settings::load_from_path(dir.path()).unwrap();
        assert_eq!(settings.backend.base_url, "https://mdm.example.com/api");
        assert_eq!(settings.backend.timeout_seconds, 10);
        assert_eq!(settings.backend.api_token.as_deref(), Some("secret"));
        assert_eq!(settings.schedule.timezone, "Asia/Ho_Chi_Minh");
        assert_eq!(settings.observability.log_format, LogFormat::Json);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_empty_directory_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from_path(dir.path()).unwrap();
        assert_eq!(settings.backend.base_url, Settings::default().backend.base_url);
        assert_eq!(settings.schedule.timezone, "UTC");
        assert!(settings.validate().is_ok());
    }
}
