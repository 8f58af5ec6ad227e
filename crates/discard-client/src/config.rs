//! Client configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (DISCARD_*)
//! - TOML configuration file
//! - Command line arguments, applied last

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Origin of the chat web app, e.g. `https://chat.example.com`.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Channels to subscribe to on connect. The first one is active.
    #[serde(default = "default_channels")]
    pub channels: Vec<String>,

    /// Reconnect policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Reconnect configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Re-open the connection after it closes.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Delay before the first reconnect attempt in milliseconds.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for the reconnect delay in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directives used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter.
    #[serde(default)]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_origin() -> String {
    std::env::var("DISCARD_ORIGIN").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
}

fn default_channels() -> Vec<String> {
    std::env::var("DISCARD_CHANNELS")
        .map(|list| parse_channel_list(&list))
        .unwrap_or_default()
}

fn default_true() -> bool {
    true
}

fn default_initial_delay() -> u64 {
    500
}

fn default_max_delay() -> u64 {
    30_000 // 30 seconds
}

fn default_log_filter() -> String {
    "discard=info".to_string()
}

fn default_metrics_port() -> u16 {
    9091
}

/// Split a comma-separated channel list, skipping blanks.
fn parse_channel_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            channels: default_channels(),
            reconnect: ReconnectConfig::default(),
            log: LogConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from `explicit`, or the first default path that
    /// exists, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen config file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let config_paths = [
            "discard.toml",
            "/etc/discard/discard.toml",
            "~/.config/discard/discard.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Reconnect delay bounds.
    #[must_use]
    pub fn reconnect_delays(&self) -> (Duration, Duration) {
        let initial = Duration::from_millis(self.reconnect.initial_delay_ms.max(1));
        let max = Duration::from_millis(self.reconnect.max_delay_ms).max(initial);
        (initial, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.reconnect.enabled);
        assert_eq!(config.reconnect.initial_delay_ms, 500);
        assert_eq!(config.log.filter, "discard=info");
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            origin = "https://chat.example.com"
            channels = ["general", "random"]

            [reconnect]
            enabled = false
            max_delay_ms = 5000

            [metrics]
            enabled = true
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.origin, "https://chat.example.com");
        assert_eq!(config.channels, vec!["general", "random"]);
        assert!(!config.reconnect.enabled);
        assert_eq!(config.reconnect.initial_delay_ms, 500);
        assert_eq!(config.reconnect.max_delay_ms, 5000);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 9091);
    }

    #[test]
    fn test_reconnect_delays_are_ordered() {
        let mut config = Config::default();
        config.reconnect.initial_delay_ms = 2000;
        config.reconnect.max_delay_ms = 100;

        let (initial, max) = config.reconnect_delays();
        assert_eq!(initial, Duration::from_secs(2));
        assert_eq!(max, initial);
    }

    #[test]
    fn test_parse_channel_list() {
        assert_eq!(parse_channel_list(" a, ,b,"), vec!["a", "b"]);
        assert!(parse_channel_list("").is_empty());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/discard.toml"))).is_err());
    }
}
