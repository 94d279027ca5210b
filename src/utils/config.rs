//! Tracker configuration
//!
//! A small JSON file covering the tunable surface: field dimensions and the
//! demo feed cadence. Smoothing factors, history limits and the staleness
//! window are fixed constants, see [`crate::core::constants`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::constants::{
    DEFAULT_DEMO_INTERVAL_MS, DEFAULT_FIELD_HEIGHT_CM, DEFAULT_FIELD_WIDTH_CM,
};
use crate::core::FieldGeometry;

/// Configuration load or validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field is out of range
    #[error("invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// The file could not be read or written
    #[error("config file '{path}': {message}")]
    Io { path: String, message: String },

    /// The file is not valid JSON for this schema
    #[error("config file '{path}' did not parse: {message}")]
    Parse { path: String, message: String },
}

/// Tunable tracker parameters
///
/// Fields missing from the file fall back to their defaults, so a partial
/// config overriding only the field size is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Field width in centimeters
    pub width_cm: f64,
    /// Field height in centimeters
    pub height_cm: f64,
    /// Interval between simulated reading batches in milliseconds
    pub demo_interval_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            width_cm: DEFAULT_FIELD_WIDTH_CM,
            height_cm: DEFAULT_FIELD_HEIGHT_CM,
            demo_interval_ms: DEFAULT_DEMO_INTERVAL_MS,
        }
    }
}

impl TrackerConfig {
    /// Loads and validates a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            path: path_str.clone(),
            message: e.to_string(),
        })?;

        let config: TrackerConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path_str,
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Writes the config as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path_str.clone(),
            message: e.to_string(),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::Io {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Checks every field is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.width_cm.is_finite() || self.width_cm <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "width_cm".to_string(),
                value: self.width_cm.to_string(),
                reason: "field width must be a positive number".to_string(),
            });
        }
        if !self.height_cm.is_finite() || self.height_cm <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "height_cm".to_string(),
                value: self.height_cm.to_string(),
                reason: "field height must be a positive number".to_string(),
            });
        }
        if self.demo_interval_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "demo_interval_ms".to_string(),
                value: "0".to_string(),
                reason: "demo cadence must be at least 1 ms".to_string(),
            });
        }
        Ok(())
    }

    /// Anchor layout for the configured field
    pub fn geometry(&self) -> FieldGeometry {
        FieldGeometry::new(self.width_cm, self.height_cm)
    }
}
