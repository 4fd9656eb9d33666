//! Synthetic LiDAR / radar / GPS measurements
//!
//! `SensorSimulator` stands in for real sensors. Each reading is an unbiased
//! draw around the underlying quantity with bounded variance; exactly one
//! reading is produced per tick, before the filters run.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::config::SensorConfig;
use crate::error::{FcaError, Result};

/// Raw measurements for one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Noisy range to the nearest obstacle (m)
    pub lidar_range: f64,
    /// Noisy target speed (m/s)
    pub radar_speed: f64,
    /// Ego speed (m/s)
    pub gps_speed: f64,
}

/// Anything that can produce one reading per tick.
pub trait MeasurementSource: Send {
    /// Sample all channels given the true nearest-obstacle range.
    fn sample(&mut self, true_range: f64) -> SensorReading;
}

/// Seeded synthetic sensor suite
#[derive(Debug, Clone)]
pub struct SensorSimulator {
    rng: ChaCha8Rng,
    lidar_noise: Normal<f64>,
    radar_noise: Normal<f64>,
    radar_speed: (f64, f64),
    gps_speed: (f64, f64),
}

impl SensorSimulator {
    pub fn new(config: &SensorConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let lidar_noise = Normal::new(0.0, config.lidar_noise_std)
            .map_err(|e| FcaError::InvalidConfig(format!("lidar noise: {}", e)))?;
        let radar_noise = Normal::new(0.0, config.radar_noise_std)
            .map_err(|e| FcaError::InvalidConfig(format!("radar noise: {}", e)))?;

        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            lidar_noise,
            radar_noise,
            radar_speed: (config.radar_speed_min, config.radar_speed_max),
            gps_speed: (config.gps_speed_min, config.gps_speed_max),
        })
    }
}

impl MeasurementSource for SensorSimulator {
    fn sample(&mut self, true_range: f64) -> SensorReading {
        let gps_speed = self.rng.gen_range(self.gps_speed.0..=self.gps_speed.1);
        let radar_true = self.rng.gen_range(self.radar_speed.0..=self.radar_speed.1);
        let radar_speed = radar_true + self.radar_noise.sample(&mut self.rng);
        let lidar_range = true_range + self.lidar_noise.sample(&mut self.rng);

        SensorReading { lidar_range, radar_speed, gps_speed }
    }
}

/// Replays a fixed list of readings, repeating the last one when exhausted.
///
/// Useful for driving the pipeline with hand-picked (including non-finite)
/// values.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    readings: Vec<SensorReading>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(readings: Vec<SensorReading>) -> Self {
        Self { readings, cursor: 0 }
    }

    /// Always return the same reading.
    pub fn constant(reading: SensorReading) -> Self {
        Self::new(vec![reading])
    }

    /// Readings handed out so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl MeasurementSource for ScriptedSource {
    fn sample(&mut self, true_range: f64) -> SensorReading {
        let idx = self.cursor.min(self.readings.len().saturating_sub(1));
        self.cursor += 1;
        self.readings.get(idx).copied().unwrap_or(SensorReading {
            lidar_range: true_range,
            radar_speed: 0.0,
            gps_speed: 0.0,
        })
    }
}
