//! Configuration types for the API monitor service

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Targets monitored from startup
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Per-monitor polling settings, shared by every target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Number of latency samples kept per target
    #[serde(default = "default_latency_history")]
    pub latency_history: usize,
    /// Number of error events kept per target
    #[serde(default = "default_error_history")]
    pub error_history: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            timeout: default_timeout(),
            latency_history: default_latency_history(),
            error_history: default_error_history(),
        }
    }
}

/// Upper bound for either history length
pub const MAX_HISTORY: usize = 100_000;

impl PollingConfig {
    /// Reject settings that would busy-loop or exhaust memory
    pub fn validate(&self) -> crate::Result<()> {
        if self.interval.is_zero() {
            return Err(crate::ApiMonitorError::Config(
                "polling.interval must be greater than zero".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(crate::ApiMonitorError::Config(
                "polling.timeout must be greater than zero".to_string(),
            ));
        }
        for (name, value) in [
            ("latency_history", self.latency_history),
            ("error_history", self.error_history),
        ] {
            if value > MAX_HISTORY {
                return Err(crate::ApiMonitorError::Config(format!(
                    "polling.{} must be at most {}, got {}",
                    name, MAX_HISTORY, value
                )));
            }
        }
        Ok(())
    }
}

/// Dashboard (HTTP API) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_dashboard_port(),
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_latency_history() -> usize {
    100
}

fn default_error_history() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_dashboard_port() -> u16 {
    11120
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::ApiMonitorError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    config.polling.validate()?;
    Ok(config)
}
