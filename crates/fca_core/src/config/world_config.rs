//! Obstacle field geometry

use serde::{Deserialize, Serialize};

use crate::error::{FcaError, Result};

/// Obstacle count, motion and recycling bounds
///
/// Ranges are distances along the path; obstacles ahead of the vehicle sit
/// at negative `range_along_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Number of obstacles (default: 3)
    pub obstacle_count: usize,
    /// Range advance per tick in meters (default: 0.5)
    pub step_per_tick: f64,
    /// An obstacle past this range is recycled (default: 5.0)
    pub near_bound: f64,
    /// Respawn range interval `[-far_bound, -near_respawn_bound]` (default: 25.0 / 10.0)
    pub far_bound: f64,
    pub near_respawn_bound: f64,
    /// Lateral offsets are drawn from `[-lateral_extent, lateral_extent]` (default: 2.0)
    pub lateral_extent: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            obstacle_count: 3,
            step_per_tick: 0.5,
            near_bound: 5.0,
            far_bound: 25.0,
            near_respawn_bound: 10.0,
            lateral_extent: 2.0,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<()> {
        if self.obstacle_count == 0 {
            return Err(FcaError::InvalidConfig("world.obstacle_count must be >= 1".to_string()));
        }
        let finite = [
            self.step_per_tick,
            self.near_bound,
            self.far_bound,
            self.near_respawn_bound,
            self.lateral_extent,
        ]
        .iter()
        .all(|v| v.is_finite());
        if !finite {
            return Err(FcaError::InvalidConfig("world bounds must be finite".to_string()));
        }
        if self.near_respawn_bound < 0.0 || self.far_bound < self.near_respawn_bound {
            return Err(FcaError::InvalidConfig(format!(
                "world respawn interval is invalid: far_bound {} < near_respawn_bound {}",
                self.far_bound, self.near_respawn_bound
            )));
        }
        if self.lateral_extent < 0.0 {
            return Err(FcaError::InvalidConfig(format!(
                "world.lateral_extent must be >= 0, got {}",
                self.lateral_extent
            )));
        }
        Ok(())
    }
}
