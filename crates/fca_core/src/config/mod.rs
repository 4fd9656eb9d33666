//! # Simulation Configuration
//!
//! Static settings read once before the first tick. Loaded from YAML or JSON
//! (by file extension) or built from a preset.
//!
//! ## Usage
//! ```rust
//! use fca_core::config::SimulationConfig;
//!
//! let config = SimulationConfig::default();
//! assert!(config.validate().is_ok());
//! let noisy = SimulationConfig::high_noise();
//! assert!(noisy.sensors.lidar_noise_std > config.sensors.lidar_noise_std);
//! ```

mod filter_config;
mod sensor_config;
mod world_config;

pub use filter_config::FilterConfig;
pub use sensor_config::SensorConfig;
pub use world_config::WorldConfig;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FcaError, Result};

fn default_seed() -> u64 {
    42
}

/// Full pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Run length in seconds (default: 30)
    pub duration_secs: f64,
    /// Ticks per second (default: 1)
    pub refresh_rate_hz: f64,
    /// TTC below this many seconds triggers braking (default: 2.0)
    pub safe_ttc_threshold: f64,
    /// True range below this many meters is a collision (default: 2.0)
    pub collision_distance: f64,
    /// LiDAR range filter
    pub range_filter: FilterConfig,
    /// Radar speed filter
    pub speed_filter: FilterConfig,
    #[serde(default)]
    pub sensors: SensorConfig,
    #[serde(default)]
    pub world: WorldConfig,
    /// RNG seed for sensors and obstacle placement
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Run the filters on collision ticks too. Off by default: collision
    /// ticks freeze both filters.
    #[serde(default)]
    pub update_filters_on_collision: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_secs: 30.0,
            refresh_rate_hz: 1.0,
            safe_ttc_threshold: 2.0,
            collision_distance: 2.0,
            range_filter: FilterConfig::range_default(),
            speed_filter: FilterConfig::speed_default(),
            sensors: SensorConfig::default(),
            world: WorldConfig::default(),
            seed: default_seed(),
            update_filters_on_collision: false,
        }
    }
}

impl SimulationConfig {
    /// 3D obstacle simulation settings (default)
    pub fn realistic() -> Self {
        Self::default()
    }

    /// Noisier LiDAR, as in the filtered TTC plot demo
    pub fn high_noise() -> Self {
        let mut cfg = Self::default();
        cfg.sensors.lidar_noise_std = 5.0;
        cfg
    }

    /// Near-noiseless sensors for tests
    pub fn deterministic() -> Self {
        let mut cfg = Self::default();
        cfg.sensors.lidar_noise_std = 0.0;
        cfg.sensors.radar_noise_std = 0.0;
        cfg.sensors.radar_speed_min = 15.0;
        cfg.sensors.radar_speed_max = 15.0;
        cfg.sensors.gps_speed_min = 20.0;
        cfg.sensors.gps_speed_max = 20.0;
        cfg
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "realistic" => Some(Self::realistic()),
            "high_noise" | "high-noise" => Some(Self::high_noise()),
            "deterministic" => Some(Self::deterministic()),
            _ => None,
        }
    }

    /// Fixed tick period (`1 / refresh_rate_hz`).
    pub fn tick_period(&self) -> Duration {
        self.tick_boundary(1)
    }

    /// Run length, saturating at `Duration::MAX` for unvalidated values.
    pub fn duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.duration_secs).unwrap_or(Duration::MAX)
    }

    /// Offset of the `ticks`-th boundary from the run start (`ticks / rate`).
    pub fn tick_boundary(&self, ticks: u64) -> Duration {
        Duration::try_from_secs_f64(ticks as f64 / self.refresh_rate_hz).unwrap_or(Duration::MAX)
    }

    /// Number of ticks a full run produces.
    pub fn expected_ticks(&self) -> u64 {
        (self.duration_secs * self.refresh_rate_hz).ceil() as u64
    }

    pub fn validate(&self) -> Result<()> {
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            return Err(FcaError::InvalidConfig(format!(
                "duration_secs must be >= 0, got {}",
                self.duration_secs
            )));
        }
        if !self.refresh_rate_hz.is_finite() || self.refresh_rate_hz <= 0.0 {
            return Err(FcaError::InvalidConfig(format!(
                "refresh_rate_hz must be > 0, got {}",
                self.refresh_rate_hz
            )));
        }
        if !self.safe_ttc_threshold.is_finite() || self.safe_ttc_threshold < 0.0 {
            return Err(FcaError::InvalidConfig(format!(
                "safe_ttc_threshold must be >= 0, got {}",
                self.safe_ttc_threshold
            )));
        }
        if !self.collision_distance.is_finite() || self.collision_distance < 0.0 {
            return Err(FcaError::InvalidConfig(format!(
                "collision_distance must be >= 0, got {}",
                self.collision_distance
            )));
        }
        self.validate_timing()?;
        self.range_filter.validate("range_filter")?;
        self.speed_filter.validate("speed_filter")?;
        self.sensors.validate()?;
        self.world.validate()?;
        Ok(())
    }

    /// The run length, the tick period and the boundary after the last tick
    /// must all be representable as a `Duration`.
    fn validate_timing(&self) -> Result<()> {
        if Duration::try_from_secs_f64(self.duration_secs).is_err() {
            return Err(FcaError::InvalidConfig(format!(
                "duration_secs is too large, got {}",
                self.duration_secs
            )));
        }
        let period = 1.0 / self.refresh_rate_hz;
        if Duration::try_from_secs_f64(period).is_err() {
            return Err(FcaError::InvalidConfig(format!(
                "refresh_rate_hz is too small, got {}",
                self.refresh_rate_hz
            )));
        }
        let last_boundary = self.expected_ticks() as f64 / self.refresh_rate_hz;
        if Duration::try_from_secs_f64(last_boundary).is_err()
            || Duration::try_from_secs_f64(self.duration_secs + period).is_err()
        {
            return Err(FcaError::InvalidConfig(format!(
                "duration_secs {} at refresh_rate_hz {} overflows the tick schedule",
                self.duration_secs, self.refresh_rate_hz
            )));
        }
        Ok(())
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(FcaError::ConfigParse(format!(
                "unsupported config extension {:?} for {}",
                other,
                path.display()
            ))),
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

// ========== Tests ==========
