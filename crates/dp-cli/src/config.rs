//! Configuration loading and management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use dp_core::TimerConfig;
use dp_store::DataPaths;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Directory name used under the platform config and data directories.
const APP_DIR: &str = "deskpresence";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `sessions.csv` and `sessions.json`.
    pub data_dir: PathBuf,
    /// Continuous presence required before time starts counting.
    pub start_grace_secs: f64,
    /// Continuous absence required before counting stops.
    pub stop_grace_secs: f64,
    /// Spacing of heartbeat rows in the event log.
    pub heartbeat_interval_secs: f64,
    /// Period of the sampling tick in `dp watch`.
    pub tick_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        let timer = TimerConfig::default();
        Self {
            data_dir: dirs_data_path().unwrap_or_else(|| PathBuf::from(".")),
            start_grace_secs: timer.start_grace_secs,
            stop_grace_secs: timer.stop_grace_secs,
            heartbeat_interval_secs: timer.heartbeat_interval_secs,
            tick_ms: 500,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (DP_*)
        figment = figment.merge(Env::prefixed("DP_"));

        figment.extract()
    }

    pub fn paths(&self) -> DataPaths {
        DataPaths::new(&self.data_dir)
    }

    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig {
            start_grace_secs: self.start_grace_secs.max(0.0),
            stop_grace_secs: self.stop_grace_secs.max(0.0),
            heartbeat_interval_secs: self.heartbeat_interval_secs,
        }
    }

    /// Sampling period, never shorter than 50 ms.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(50))
    }
}

/// Returns the platform-specific config directory for dp.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_DIR))
}

/// Returns the platform-specific data directory for dp.
///
/// On Linux: `~/.local/share/deskpresence`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join(APP_DIR))
}
