//! Configuration file support for dot11dump
//!
//! Supports loading configuration from TOML files.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capture device settings
    pub capture: CaptureConfig,

    /// Record output settings
    pub output: OutputConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;
        let mut config = Self::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Serialize configuration to a TOML string
    #[allow(clippy::inherent_to_string_shadow_display)]
    pub fn to_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save configuration to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_string()?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))
    }

    /// Generate default config file content with comments
    pub fn default_with_comments() -> &'static str {
        DEFAULT_CONFIG
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - DOT11_DEVICE
    /// - DOT11_LOG_LEVEL
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("DOT11_DEVICE") {
            self.capture.device = v;
        }
        if let Some(v) = lookup("DOT11_LOG_LEVEL") {
            self.logging.level = v;
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Capture device settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Monitor-mode interface to open
    pub device: String,

    /// Snapshot length in bytes
    pub snaplen: u32,

    /// Put the interface in promiscuous mode
    pub promiscuous: bool,

    /// Poll timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: "wlan0mon".to_string(),
            snaplen: 1600,
            promiscuous: false,
            timeout_ms: 100,
        }
    }
}

impl CaptureConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Record output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Record output settings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "text" or "json"
    pub format: OutputFormat,

    /// Hide records whose destination is a broadcast/multicast address
    pub skip_broadcast: bool,
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# dot11dump Configuration
# =======================

[capture]
# Monitor-mode interface used by `dot11dump live`
device = "wlan0mon"

# Snapshot length (bytes kept per frame)
snaplen = 1600

# Monitor mode already sees every frame; promiscuous is rarely needed
promiscuous = false

# Poll timeout (milliseconds); an expired poll yields no frame
timeout_ms = 100

[output]
# Record format: "text" or "json"
format = "text"

# Hide records sent to broadcast/multicast destinations
skip_broadcast = false

[logging]
# Log level: "trace", "debug", "info", "warn", "error"
# RUST_LOG takes precedence when set
level = "info"
"#;
