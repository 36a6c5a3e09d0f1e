//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::format::DisplayZone;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where snapshots come from
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_stats_path")]
    pub stats_path: String,

    #[serde(default = "default_recent_activity_path")]
    pub recent_activity_path: String,

    /// Unset means requests may take as long as the server needs
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_stats_path() -> String {
    "/api/stats".to_string()
}

fn default_recent_activity_path() -> String {
    "/api/recent-activity".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            stats_path: default_stats_path(),
            recent_activity_path: default_recent_activity_path(),
            request_timeout_ms: None,
        }
    }
}

/// Refresh cadence and view timings
#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval")]
    pub interval_ms: u64,

    #[serde(default = "default_highlight")]
    pub highlight_ms: u64,

    #[serde(default = "default_notification")]
    pub notification_ms: u64,

    #[serde(default = "default_recent_limit")]
    pub recent_messages_limit: usize,

    #[serde(default = "default_skip_overlapping")]
    pub skip_overlapping_cycles: bool,
}

fn default_interval() -> u64 {
    5000 // 5 seconds
}

fn default_highlight() -> u64 {
    500
}

fn default_notification() -> u64 {
    5000
}

fn default_recent_limit() -> usize {
    10
}

fn default_skip_overlapping() -> bool {
    true
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval(),
            highlight_ms: default_highlight(),
            notification_ms: default_notification(),
            recent_messages_limit: default_recent_limit(),
            skip_overlapping_cycles: default_skip_overlapping(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn highlight(&self) -> Duration {
        Duration::from_millis(self.highlight_ms)
    }

    pub fn notification(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }
}

/// Rendering options
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// `local`, `utc` or a fixed offset such as `+02:00`
    #[serde(default = "default_time_zone")]
    pub time_zone: String,

    /// Fill icon placeholders with unicode glyphs
    #[serde(default = "default_glyphs")]
    pub glyphs: bool,
}

fn default_time_zone() -> String {
    "local".to_string()
}

fn default_glyphs() -> bool {
    true
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
            glyphs: default_glyphs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("liveboard").join("config.toml")),
            Some(PathBuf::from("./liveboard.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        match Self::from_env() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring environment overrides: {}", e);
                Config::default()
            }
        }
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "polling.interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.polling.recent_messages_limit == 0 {
            return Err(ConfigError::Invalid(
                "polling.recent_messages_limit must be greater than zero".to_string(),
            ));
        }
        if self.display_zone().is_none() {
            return Err(ConfigError::Invalid(format!(
                "display.time_zone {:?} is not `local`, `utc` or an offset like +02:00",
                self.display.time_zone
            )));
        }
        Ok(())
    }

    /// Parsed display zone
    pub fn display_zone(&self) -> Option<DisplayZone> {
        DisplayZone::parse(&self.display.time_zone)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("LIVEBOARD_BASE_URL") {
            self.source.base_url = url;
        }
        if let Ok(interval) = std::env::var("LIVEBOARD_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.polling.interval_ms = ms;
            }
        }
        if let Ok(zone) = std::env::var("LIVEBOARD_TIME_ZONE") {
            self.display.time_zone = zone;
        }

        if let Ok(level) = std::env::var("LIVEBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LIVEBOARD_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Liveboard Configuration
#
# Environment variables override these settings:
# - LIVEBOARD_BASE_URL
# - LIVEBOARD_INTERVAL_MS
# - LIVEBOARD_TIME_ZONE
# - LIVEBOARD_LOG_LEVEL
# - LIVEBOARD_LOG_FORMAT

[source]
# Dashboard backend
base_url = "http://localhost:5000"

# Endpoint paths
stats_path = "/api/stats"
recent_activity_path = "/api/recent-activity"

# Optional request timeout (ms). Unset: wait as long as the server takes.
# request_timeout_ms = 4000

[polling]
# Stats refresh interval (ms)
interval_ms = 5000

# How long a changed counter stays highlighted (ms)
highlight_ms = 500

# How long an error banner stays up (ms)
notification_ms = 5000

# Rows shown in the recent messages list
recent_messages_limit = 10

# Skip a tick while the previous refresh is still running
skip_overlapping_cycles = true

[display]
# Time zone for timestamps: local, utc, or an offset like +02:00
time_zone = "local"

# Fill icon placeholders with unicode glyphs
glyphs = true

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
