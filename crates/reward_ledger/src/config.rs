//! Ledger service configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Result;

/// Environment variable holding the oracle keypair
pub const ORACLE_SECRET_KEY_ENV: &str = "ORACLE_SECRET_KEY";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// SQLite database holding the ledger state
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Reward units credited per accepted telemetry ping
    #[serde(default = "default_reward_per_ping")]
    pub reward_per_ping: u64,

    /// Plausible sensor ranges
    #[serde(default)]
    pub bounds: TelemetryBounds,
}

fn default_state_path() -> PathBuf {
    PathBuf::from("ledger.db")
}

fn default_reward_per_ping() -> u64 {
    1
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            reward_per_ping: default_reward_per_ping(),
            bounds: TelemetryBounds::default(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from `path`, or defaults if the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: LedgerConfig = serde_json::from_str(&content)?;
            info!("Loaded ledger config from {:?}", path);
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Saved ledger config to {:?}", path);
        Ok(())
    }
}

/// Inclusive ranges outside of which a reading is treated as malformed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryBounds {
    /// Degrees Celsius
    #[serde(default = "default_temperature_min")]
    pub temperature_min: f64,
    #[serde(default = "default_temperature_max")]
    pub temperature_max: f64,

    /// Relative humidity, percent
    #[serde(default = "default_humidity_min")]
    pub humidity_min: f64,
    #[serde(default = "default_humidity_max")]
    pub humidity_max: f64,
}

fn default_temperature_min() -> f64 {
    -100.0
}

fn default_temperature_max() -> f64 {
    80.0
}

fn default_humidity_min() -> f64 {
    0.0
}

fn default_humidity_max() -> f64 {
    100.0
}

impl Default for TelemetryBounds {
    fn default() -> Self {
        Self {
            temperature_min: default_temperature_min(),
            temperature_max: default_temperature_max(),
            humidity_min: default_humidity_min(),
            humidity_max: default_humidity_max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.state_path, PathBuf::from("ledger.db"));
        assert_eq!(config.reward_per_ping, 1);
        assert_eq!(config.bounds.temperature_min, -100.0);
        assert_eq!(config.bounds.temperature_max, 80.0);
        assert_eq!(config.bounds.humidity_min, 0.0);
        assert_eq!(config.bounds.humidity_max, 100.0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: LedgerConfig = serde_json::from_str(r#"{"reward_per_ping": 5}"#).unwrap();
        assert_eq!(config.reward_per_ping, 5);
        assert_eq!(config.state_path, PathBuf::from("ledger.db"));
        assert_eq!(config.bounds, TelemetryBounds::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = std::env::temp_dir().join(format!("reward-ledger-config-{}", std::process::id()));
        let path = dir.join("config.json");

        let mut config = LedgerConfig::default();
        config.reward_per_ping = 3;
        config.bounds.humidity_max = 95.0;
        config.save_to(&path).unwrap();

        let loaded = LedgerConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("reward-ledger-config-does-not-exist.json");
        assert_eq!(LedgerConfig::load_from(&path).unwrap(), LedgerConfig::default());
    }
}
