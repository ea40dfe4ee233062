//! Configuration management for Elektra
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{ElektraError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// EVSE charge controller configuration
    pub evse: EvseConfig,

    /// Battery inverter configuration
    pub battery: BatteryConfig,

    /// Tariff-window scheduling configuration
    pub tariff: TariffConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

/// EVSE Modbus connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvseConfig {
    /// IP address of the Modbus gateway
    pub ip: String,

    /// TCP port (typically 502)
    pub port: u16,

    /// Modbus unit identifier of the charge controller
    pub unit_id: u8,

    /// Current in amperes to apply during a scheduled charging hour
    pub charge_current_a: u16,
}

/// Battery inverter HTTP parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// IP address or hostname of the inverter
    pub ip_address: String,

    /// Meter id used for the per-meter state-of-charge fallback path
    pub meter_id: u8,
}

/// Tariff-window scheduling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TariffConfig {
    /// Number of cheapest hours to select within the window
    pub duration_hours: u32,

    /// Length of the eligible charging window in hours, starting at plan time
    pub window_hours: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level override
    pub console_level: Option<String>,

    /// Optional file-specific level override
    pub file_level: Option<String>,

    /// Path to log file or directory
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Default for EvseConfig {
    fn default() -> Self {
        Self {
            ip: "192.168.1.100".to_string(),
            port: 502,
            unit_id: 1,
            charge_current_a: 16,
        }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            ip_address: "192.168.1.101".to_string(),
            meter_id: 0,
        }
    }
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            duration_hours: 4,
            window_hours: 24,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: "/tmp/elektra.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            evse: EvseConfig::default(),
            battery: BatteryConfig::default(),
            tariff: TariffConfig::default(),
            logging: LoggingConfig::default(),
            poll_interval_ms: 5000,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        let default_paths = [
            "elektra_config.yaml",
            "/data/elektra_config.yaml",
            "/etc/elektra/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.evse.ip.is_empty() {
            return Err(ElektraError::validation(
                "evse.ip",
                "IP address cannot be empty",
            ));
        }

        if self.evse.port == 0 {
            return Err(ElektraError::validation(
                "evse.port",
                "Port must be greater than 0",
            ));
        }

        if self.evse.charge_current_a == 0 {
            return Err(ElektraError::validation(
                "evse.charge_current_a",
                "Must be positive",
            ));
        }

        if self.battery.ip_address.is_empty() {
            return Err(ElektraError::validation(
                "battery.ip_address",
                "IP address cannot be empty",
            ));
        }

        if self.tariff.window_hours == 0 {
            return Err(ElektraError::validation(
                "tariff.window_hours",
                "Must be greater than 0",
            ));
        }

        if self.poll_interval_ms == 0 {
            return Err(ElektraError::validation(
                "poll_interval_ms",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.evse.port, 502);
        assert_eq!(config.evse.unit_id, 1);
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.tariff.window_hours, 24);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        // Test invalid IP
        config.evse.ip = String::new();
        assert!(config.validate().is_err());

        // Reset and test invalid window
        config = Config::default();
        config.tariff.window_hours = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.evse.port, deserialized.evse.port);
        assert_eq!(config.battery.meter_id, deserialized.battery.meter_id);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "evse:\n  ip: 10.0.0.9\n  port: 1502\n  unit_id: 3\n  charge_current_a: 10\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.evse.ip, "10.0.0.9");
        assert_eq!(config.poll_interval_ms, 5000);
    }
}
