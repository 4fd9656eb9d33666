//! Tick Loop
//!
//! `Simulation` owns every piece of mutable pipeline state (filters,
//! obstacles, sensor source) and is driven by exactly one thread. Each tick
//! it publishes an immutable `SimulationSnapshot` for consumers.
//!
//! ## Per-tick order
//! 1. advance obstacles, recycling the ones that passed the near bound
//! 2. find the nearest obstacle
//! 3. sample the sensors once
//! 4. collision short-circuit: filters stay frozen for this tick
//! 5. otherwise update both filters and evaluate TTC
//! 6. publish, then sleep to the next tick boundary
//!
//! ## Usage
//! ```rust
//! use fca_core::clock::{ManualClock, StopHandle};
//! use fca_core::config::SimulationConfig;
//! use fca_core::simulation::Simulation;
//!
//! let mut config = SimulationConfig::default();
//! config.duration_secs = 3.0;
//! let mut sim = Simulation::new(config).unwrap();
//! let summary = sim.run(&mut ManualClock::new(), &StopHandle::new());
//! assert_eq!(summary.ticks, 3);
//! ```

#[cfg(test)]
mod tests;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, ManualClock, StopHandle};
use crate::config::SimulationConfig;
use crate::error::{Channel, FcaError, Result};
use crate::estimator::ScalarEstimator;
use crate::risk::{CollisionRiskEvaluator, Decision, TickResult};
use crate::sensors::{MeasurementSource, SensorSimulator};
use crate::snapshot::{SimState, SimulationSnapshot, SnapshotPublisher, SnapshotReader};
use crate::world::{Obstacle, ObstacleField};

/// Aggregate statistics over a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub safe_ticks: u64,
    pub brake_ticks: u64,
    pub collision_ticks: u64,
    /// Ticks where at least one measurement was rejected
    pub degraded_ticks: u64,
    /// Obstacles recycled during the run
    pub respawns: u64,
    /// Lowest TTC seen on a non-collision tick
    pub min_ttc: Option<f64>,
}

impl RunSummary {
    fn record(&mut self, result: &TickResult) {
        self.ticks += 1;
        match result.decision {
            Decision::Safe => self.safe_ticks += 1,
            Decision::Brake => self.brake_ticks += 1,
            Decision::Collision => self.collision_ticks += 1,
        }
        if result.degraded {
            self.degraded_ticks += 1;
        }
        if result.decision != Decision::Collision {
            self.min_ttc = Some(self.min_ttc.map_or(result.ttc, |m| m.min(result.ttc)));
        }
    }
}

/// Single-producer simulation state
pub struct Simulation<S = SensorSimulator> {
    config: SimulationConfig,
    range_filter: ScalarEstimator,
    speed_filter: ScalarEstimator,
    evaluator: CollisionRiskEvaluator,
    world: ObstacleField,
    source: S,
    publisher: SnapshotPublisher,
    state: SimState,
    tick: u64,
    /// Last finite GPS speed, reused when a reading is rejected
    last_ego_speed: f64,
    last_result: TickResult,
    summary: RunSummary,
}

impl Simulation<SensorSimulator> {
    /// Validate the configuration and build the pipeline with synthetic
    /// sensors and randomly placed obstacles.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let source = SensorSimulator::new(&config.sensors, config.seed)?;
        let world = ObstacleField::new(&config.world, config.seed)?;
        Self::assemble(config, source, world)
    }
}

impl<S: MeasurementSource> Simulation<S> {
    fn assemble(config: SimulationConfig, source: S, world: ObstacleField) -> Result<Self> {
        let range_filter = config.range_filter.build(Channel::Range)?;
        let speed_filter = config.speed_filter.build(Channel::Speed)?;
        let evaluator = CollisionRiskEvaluator::new(config.collision_distance, config.safe_ttc_threshold);

        let publisher = SnapshotPublisher::new();
        publisher.publish(SimulationSnapshot::initial(world.obstacles().to_vec()));

        Ok(Self {
            config,
            range_filter,
            speed_filter,
            evaluator,
            world,
            source,
            publisher,
            state: SimState::Running,
            tick: 0,
            last_ego_speed: 0.0,
            last_result: TickResult::initial(),
            summary: RunSummary::default(),
        })
    }

    /// Swap the measurement source (scripted readings, hardware adapters).
    pub fn with_source<T: MeasurementSource>(self, source: T) -> Simulation<T> {
        Simulation {
            config: self.config,
            range_filter: self.range_filter,
            speed_filter: self.speed_filter,
            evaluator: self.evaluator,
            world: self.world,
            source,
            publisher: self.publisher,
            state: self.state,
            tick: self.tick,
            last_ego_speed: self.last_ego_speed,
            last_result: self.last_result,
            summary: self.summary,
        }
    }

    /// Replace the starting obstacles.
    pub fn with_obstacles(mut self, obstacles: Vec<Obstacle>) -> Result<Self> {
        if self.tick > 0 {
            return Err(FcaError::InvalidConfig("obstacles can only be replaced before the first tick".to_string()));
        }
        self.world = ObstacleField::with_obstacles(&self.config.world, self.config.seed, obstacles)?;
        self.publisher.publish(SimulationSnapshot::initial(self.world.obstacles().to_vec()));
        Ok(self)
    }

    /// Drive ticks at `refresh_rate_hz` until `duration_secs` has elapsed on
    /// `clock` or `stop` fires.
    pub fn run<C: Clock>(&mut self, clock: &mut C, stop: &StopHandle) -> RunSummary {
        let start = clock.now();
        let duration = self.config.duration();

        info!(
            duration_secs = self.config.duration_secs,
            refresh_rate_hz = self.config.refresh_rate_hz,
            obstacles = self.world.obstacles().len(),
            "simulation started"
        );

        let mut ticks_this_run = 0u64;
        while self.state == SimState::Running {
            let elapsed = clock.now().saturating_sub(start);
            if elapsed >= duration || stop.is_stopped() {
                self.stop();
                break;
            }

            self.step_at(elapsed);
            ticks_this_run += 1;

            let next_boundary = self.config.tick_boundary(ticks_this_run);
            let now = clock.now().saturating_sub(start);
            clock.sleep(next_boundary.saturating_sub(now), stop);
        }

        info!(
            ticks = self.summary.ticks,
            brake_ticks = self.summary.brake_ticks,
            collision_ticks = self.summary.collision_ticks,
            "simulation stopped"
        );
        self.summary.clone()
    }

    /// Run the whole configured duration on a virtual clock.
    pub fn replay(&mut self) -> RunSummary {
        self.run(&mut ManualClock::new(), &StopHandle::new())
    }

    /// Run a single tick at the next period boundary, outside `run`.
    ///
    /// Once stopped this does nothing and returns the last result.
    pub fn step(&mut self) -> TickResult {
        if self.state == SimState::Stopped {
            return self.last_result;
        }
        let elapsed = self.config.tick_boundary(self.tick);
        self.step_at(elapsed)
    }

    fn step_at(&mut self, elapsed: Duration) -> TickResult {
        self.world.advance();
        let distance = self.world.nearest_distance();
        let reading = self.source.sample(distance);
        let mut degraded = false;

        let ego_speed = if reading.gps_speed.is_finite() {
            self.last_ego_speed = reading.gps_speed;
            reading.gps_speed
        } else {
            warn!(value = reading.gps_speed, "rejected {} measurement", Channel::EgoSpeed);
            degraded = true;
            self.last_ego_speed
        };

        let frozen = self.evaluator.is_collision(distance) && !self.config.update_filters_on_collision;
        if !frozen {
            degraded |= fold_measurement(&mut self.range_filter, reading.lidar_range);
            degraded |= fold_measurement(&mut self.speed_filter, reading.radar_speed);
        }

        let filtered_distance = self.range_filter.estimate();
        // A frozen tick repeats the previous closing speed instead of mixing
        // in this tick's GPS.
        let filtered_relative_speed = if frozen {
            self.last_result.filtered_relative_speed
        } else {
            ego_speed - self.speed_filter.estimate()
        };
        let mut result =
            self.evaluator
                .evaluate(distance, filtered_distance, filtered_relative_speed, ego_speed);
        result.degraded = degraded;

        self.tick += 1;
        let elapsed_secs = elapsed.as_secs_f64();
        match result.decision {
            Decision::Collision => {
                warn!(tick = self.tick, elapsed_secs, distance, "collision detected");
            }
            decision => {
                debug!(tick = self.tick, elapsed_secs, ttc = result.ttc, %decision, "tick evaluated");
            }
        }

        self.summary.record(&result);
        self.summary.respawns = self.world.respawns();
        self.last_result = result;
        self.publisher.publish(SimulationSnapshot {
            tick: self.tick,
            elapsed_secs,
            result,
            obstacles: self.world.obstacles().to_vec(),
            state: self.state,
        });

        result
    }

    /// Transition to `Stopped` and publish it.
    pub fn stop(&mut self) {
        if self.state == SimState::Stopped {
            return;
        }
        self.state = SimState::Stopped;
        self.publisher.publish_stopped();
    }

    pub fn reader(&self) -> SnapshotReader {
        self.publisher.reader()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn range_estimator(&self) -> &ScalarEstimator {
        &self.range_filter
    }

    pub fn speed_estimator(&self) -> &ScalarEstimator {
        &self.speed_filter
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        self.world.obstacles()
    }

    pub fn respawns(&self) -> u64 {
        self.world.respawns()
    }

    pub fn last_result(&self) -> &TickResult {
        &self.last_result
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Update `filter`; on a non-finite value keep the previous estimate and
/// report the tick as degraded.
fn fold_measurement(filter: &mut ScalarEstimator, value: f64) -> bool {
    match filter.update(value) {
        Ok(_) => false,
        Err(err) => {
            warn!(channel = %filter.channel(), estimate = filter.estimate(), "{}", err);
            true
        }
    }
}
