//! Synthetic sensor model parameters

use serde::{Deserialize, Serialize};

use crate::error::{FcaError, Result};

/// Noise and value ranges for the simulated LiDAR, radar and GPS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    /// LiDAR range noise standard deviation in meters (default: 2.0)
    pub lidar_noise_std: f64,
    /// Radar target speed range in m/s (default: 5.0..25.0)
    pub radar_speed_min: f64,
    pub radar_speed_max: f64,
    /// Radar speed noise standard deviation in m/s (default: 3.0)
    pub radar_noise_std: f64,
    /// GPS ego speed range in m/s (default: 10.0..30.0)
    pub gps_speed_min: f64,
    pub gps_speed_max: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            lidar_noise_std: 2.0,
            radar_speed_min: 5.0,
            radar_speed_max: 25.0,
            radar_noise_std: 3.0,
            gps_speed_min: 10.0,
            gps_speed_max: 30.0,
        }
    }
}

impl SensorConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, std) in [("lidar_noise_std", self.lidar_noise_std), ("radar_noise_std", self.radar_noise_std)]
        {
            if !std.is_finite() || std < 0.0 {
                return Err(FcaError::InvalidConfig(format!("sensors.{} must be >= 0, got {}", name, std)));
            }
        }
        check_range("radar_speed", self.radar_speed_min, self.radar_speed_max)?;
        check_range("gps_speed", self.gps_speed_min, self.gps_speed_max)?;
        Ok(())
    }
}

fn check_range(name: &str, min: f64, max: f64) -> Result<()> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(FcaError::InvalidConfig(format!(
            "sensors.{} range is invalid: [{}, {}]",
            name, min, max
        )));
    }
    Ok(())
}
