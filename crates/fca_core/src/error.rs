use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Measurement channel a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// LiDAR range to the nearest obstacle
    Range,
    /// Radar target speed
    Speed,
    /// GPS ego speed (unfiltered)
    EgoSpeed,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Channel::Range => write!(f, "range"),
            Channel::Speed => write!(f, "speed"),
            Channel::EgoSpeed => write!(f, "ego_speed"),
        }
    }
}

#[derive(Error, Debug)]
pub enum FcaError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Degenerate {channel} measurement: {value}")]
    DegenerateMeasurement { channel: Channel, value: f64 },

    #[error("Config IO error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(String),
}

impl FcaError {
    /// Whether the pipeline can keep running after this error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            FcaError::DegenerateMeasurement { .. } => true,
            FcaError::InvalidConfig(_) => false,
            FcaError::ConfigIo(_) => false,
            FcaError::ConfigParse(_) => false,
        }
    }
}

impl From<serde_json::Error> for FcaError {
    fn from(err: serde_json::Error) -> Self {
        FcaError::ConfigParse(err.to_string())
    }
}

impl From<serde_yaml::Error> for FcaError {
    fn from(err: serde_yaml::Error) -> Self {
        FcaError::ConfigParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FcaError>;
