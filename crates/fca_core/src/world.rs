//! Obstacle field owned by the tick loop
//!
//! Obstacles approach along the path at a fixed step per tick. Once one
//! passes `near_bound` it is recycled in its slot at a fresh random range
//! ahead of the vehicle.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;
use crate::error::{FcaError, Result};

/// Seed offset so obstacle placement does not share a stream with the sensors.
const WORLD_SEED_SALT: u64 = 0x5EED_0B57;

/// One obstacle on the road
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Sideways offset from the vehicle's path (m)
    pub lateral_offset: f64,
    /// Signed range along the path (m); negative is ahead of the vehicle
    pub range_along_path: f64,
}

impl Obstacle {
    pub fn new(lateral_offset: f64, range_along_path: f64) -> Self {
        Self { lateral_offset, range_along_path }
    }

    /// Absolute distance along the path.
    pub fn distance(&self) -> f64 {
        self.range_along_path.abs()
    }
}

/// All obstacles plus the RNG used to recycle them
#[derive(Debug, Clone)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    config: WorldConfig,
    rng: ChaCha8Rng,
    respawns: u64,
}

impl ObstacleField {
    /// Spawn `config.obstacle_count` obstacles at random ranges.
    pub fn new(config: &WorldConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let mut field = Self {
            obstacles: Vec::with_capacity(config.obstacle_count),
            config: config.clone(),
            rng: ChaCha8Rng::seed_from_u64(seed ^ WORLD_SEED_SALT),
            respawns: 0,
        };
        for _ in 0..config.obstacle_count {
            let obstacle = field.random_obstacle();
            field.obstacles.push(obstacle);
        }
        Ok(field)
    }

    /// Use the given starting obstacles instead of random ones.
    pub fn with_obstacles(config: &WorldConfig, seed: u64, obstacles: Vec<Obstacle>) -> Result<Self> {
        config.validate()?;
        if obstacles.is_empty() {
            return Err(FcaError::InvalidConfig("obstacle field needs at least one obstacle".to_string()));
        }
        Ok(Self {
            obstacles,
            config: config.clone(),
            rng: ChaCha8Rng::seed_from_u64(seed ^ WORLD_SEED_SALT),
            respawns: 0,
        })
    }

    /// Move every obstacle one step closer and recycle the ones that passed
    /// the near boundary. Returns how many were recycled.
    pub fn advance(&mut self) -> usize {
        let step = self.config.step_per_tick;
        let near_bound = self.config.near_bound;
        let mut recycled = 0;

        for idx in 0..self.obstacles.len() {
            self.obstacles[idx].range_along_path += step;
            if self.obstacles[idx].range_along_path > near_bound {
                self.obstacles[idx] = self.random_obstacle();
                recycled += 1;
            }
        }

        self.respawns += recycled as u64;
        recycled
    }

    /// Obstacle with the smallest absolute range.
    pub fn nearest(&self) -> Option<&Obstacle> {
        self.obstacles.iter().min_by(|a, b| a.distance().total_cmp(&b.distance()))
    }

    pub fn nearest_distance(&self) -> f64 {
        self.nearest().map(Obstacle::distance).unwrap_or(f64::INFINITY)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Total recycles since construction.
    pub fn respawns(&self) -> u64 {
        self.respawns
    }

    fn random_obstacle(&mut self) -> Obstacle {
        let extent = self.config.lateral_extent;
        let lateral_offset = self.rng.gen_range(-extent..=extent);
        let range = self.rng.gen_range(self.config.near_respawn_bound..=self.config.far_bound);
        Obstacle::new(lateral_offset, -range)
    }
}
