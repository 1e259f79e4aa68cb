//! File-based settings for `tether-tail`
//!
//! ```yaml
//! url: wss://api.huobi.pro/ws
//! subscriptions:
//!   - '{"sub":"market.btcusdt.trade.detail","id":"tail"}'
//! headers:
//!   - name: User-Agent
//!     value: tether-tail
//! reconnect_count: 100
//! reconnect_interval_ms: 1000
//! read_deadline_secs: 30
//! reply_ping: true
//! log_level: info
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tether::{states::HasUrl, ClientBuilder, DialerConfig};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// One upgrade-request header; repeated names are all sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSetting {
    pub name: String,
    pub value: String,
}

/// Settings for the tail binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailSettings {
    /// WebSocket endpoint; `TETHER_URL` overrides it
    pub url: String,
    #[serde(default)]
    pub subscriptions: Vec<String>,
    #[serde(default)]
    pub headers: Vec<HeaderSetting>,
    #[serde(default = "default_reconnect_count")]
    pub reconnect_count: usize,
    #[serde(default = "default_reconnect_interval_ms")]
    pub reconnect_interval_ms: u64,
    /// 0 disables the read deadline
    #[serde(default)]
    pub read_deadline_secs: u64,
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,
    #[serde(default = "default_close_grace_ms")]
    pub close_grace_ms: u64,
    #[serde(default = "default_handshake_timeout_secs")]
    pub handshake_timeout_secs: u64,
    /// Log handshake responses
    #[serde(default)]
    pub dump: bool,
    /// Answer text heartbeats by turning `ping` into `pong`
    #[serde(default)]
    pub reply_ping: bool,
    /// Stop after this many seconds instead of waiting for Ctrl+C
    #[serde(default)]
    pub run_for_secs: Option<u64>,
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_reconnect_count() -> usize {
    100
}

fn default_reconnect_interval_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_close_grace_ms() -> u64 {
    1000
}

fn default_handshake_timeout_secs() -> u64 {
    45
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TailSettings {
    /// Load settings from a YAML file, apply environment overrides and validate
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut settings: TailSettings = serde_yaml::from_str(&yaml_content)?;

        // Override endpoint from environment if present
        if let Ok(url) = std::env::var("TETHER_URL") {
            info!("Overriding url from environment variable");
            settings.url = url;
        }

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(SettingsError::ValidationError(
                "url must start with ws:// or wss://".to_string(),
            ));
        }

        if self.reconnect_count == 0 {
            return Err(SettingsError::ValidationError(
                "reconnect_count must be greater than 0".to_string(),
            ));
        }

        if self.run_for_secs == Some(0) {
            return Err(SettingsError::ValidationError(
                "run_for_secs must be greater than 0 when set".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(SettingsError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  URL: {}", self.url);
        info!("  Subscriptions: {}", self.subscriptions.len());
        info!("  Headers: {}", self.headers.len());
        info!(
            "  Reconnect: {} attempts every {} ms (auto: {})",
            self.reconnect_count, self.reconnect_interval_ms, self.auto_reconnect
        );
        info!("  Read deadline: {} seconds", self.read_deadline_secs);
        info!("  Reply to pings: {}", self.reply_ping);
        if let Some(secs) = self.run_for_secs {
            info!("  Run for: {} seconds", secs);
        }
        info!("  Log level: {}", self.log_level);
    }

    pub fn run_for(&self) -> Option<Duration> {
        self.run_for_secs.map(Duration::from_secs)
    }

    /// Client builder carrying every setting; handlers and shutdown are left
    /// to the caller
    pub fn into_builder(self) -> ClientBuilder<HasUrl> {
        let mut builder = tether::builder()
            .url(self.url)
            .headers(self.headers.into_iter().map(|h| (h.name, h.value)))
            .subscriptions(self.subscriptions)
            .reconnect_count(self.reconnect_count)
            .reconnect_interval(Duration::from_millis(self.reconnect_interval_ms))
            .read_deadline(Duration::from_secs(self.read_deadline_secs))
            .auto_reconnect(self.auto_reconnect)
            .close_grace(Duration::from_millis(self.close_grace_ms))
            .dialer_config(DialerConfig {
                handshake_timeout: Some(Duration::from_secs(self.handshake_timeout_secs)),
                ..DialerConfig::default()
            });
        if self.dump {
            builder = builder.dump();
        }
        builder
    }
}
