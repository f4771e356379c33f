//! System Configuration
//!
//! Parameters fixed at system-generation time: memory geometry, device
//! counts, per-disk cylinder counts, and the burst-estimation constants.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// System-generation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// Total memory size in memory units
    pub total_memory: u64,

    /// Page size in memory units (power of two, divides total memory)
    pub page_size: u64,

    /// Maximum size of a single process
    pub max_process_size: u64,

    /// Number of printers
    pub printers: usize,

    /// Cylinder count per disk (one entry per disk)
    pub disk_cylinders: Vec<u32>,

    /// Number of optical drives
    pub optical_drives: usize,

    /// History parameter α for exponential burst smoothing, in [0, 1]
    pub history_parameter: f64,

    /// Initial burst estimate for new processes (milliseconds)
    pub initial_burst_estimate: f64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            total_memory: 1024,
            page_size: 64,
            max_process_size: 1024,
            printers: 1,
            disk_cylinders: vec![100],
            optical_drives: 1,
            history_parameter: 0.5,
            initial_burst_estimate: 10.0,
        }
    }
}

impl SystemConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(e.to_string()))?;

        let config: SystemConfig = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// Validate domain constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_memory == 0 {
            return Err(ConfigError::Invalid("Total memory must be nonzero".into()));
        }

        // Page size: nonzero power of two that divides total memory evenly
        if self.page_size == 0 || !self.page_size.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "Page size {} must be a nonzero power of two",
                self.page_size
            )));
        }
        if self.total_memory % self.page_size != 0 {
            return Err(ConfigError::Invalid(format!(
                "Page size {} must divide total memory {} evenly",
                self.page_size, self.total_memory
            )));
        }

        if self.max_process_size > self.total_memory {
            return Err(ConfigError::Invalid(format!(
                "Maximum process size {} cannot exceed total memory {}",
                self.max_process_size, self.total_memory
            )));
        }

        if !(0.0..=1.0).contains(&self.history_parameter) {
            return Err(ConfigError::Invalid(format!(
                "History parameter {} must be between 0 and 1 inclusive",
                self.history_parameter
            )));
        }

        if self.initial_burst_estimate < 0.0 {
            return Err(ConfigError::Invalid(
                "Initial burst estimate cannot be negative".into(),
            ));
        }

        for (i, &cylinders) in self.disk_cylinders.iter().enumerate() {
            if cylinders == 0 {
                return Err(ConfigError::Invalid(format!(
                    "Disk {} must have at least one cylinder",
                    i + 1
                )));
            }
        }

        Ok(())
    }

    /// Total number of frames in the system
    pub fn total_frames(&self) -> usize {
        (self.total_memory / self.page_size) as usize
    }

    /// Number of disks
    pub fn disks(&self) -> usize {
        self.disk_cylinders.len()
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = SystemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_frames(), 16);
        assert_eq!(config.disks(), 1);
    }

    #[test]
    fn test_page_size_power_of_two() {
        let mut config = SystemConfig::default();
        config.page_size = 48;
        assert!(config.validate().is_err());

        config.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_size_divides_total() {
        let config = SystemConfig {
            total_memory: 100,
            page_size: 64,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_process_size_bounded() {
        let config = SystemConfig {
            max_process_size: 2048,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_history_parameter_range() {
        let mut config = SystemConfig::default();

        config.history_parameter = 0.0;
        assert!(config.validate().is_ok());
        config.history_parameter = 1.0;
        assert!(config.validate().is_ok());
        config.history_parameter = 1.1;
        assert!(config.validate().is_err());
        config.history_parameter = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_cylinder_disk_rejected() {
        let config = SystemConfig {
            disk_cylinders: vec![100, 0],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("system.json");

        let config = SystemConfig {
            total_memory: 64,
            page_size: 16,
            max_process_size: 64,
            disk_cylinders: vec![10, 20],
            ..Default::default()
        };
        config.save(&path).unwrap();

        let loaded = SystemConfig::load(&path).unwrap();
        assert_eq!(loaded.total_memory, 64);
        assert_eq!(loaded.page_size, 16);
        assert_eq!(loaded.disk_cylinders, vec![10, 20]);
    }
}
