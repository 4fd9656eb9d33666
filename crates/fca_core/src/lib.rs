//! # fca_core - Forward Collision Avoidance Pipeline
//!
//! Noisy range and speed measurements are smoothed by two independent
//! scalar Bayesian filters, turned into a time-to-collision (TTC), and
//! compared against a safety threshold to produce a SAFE / BRAKE / COLLISION
//! decision once per tick.
//!
//! ## Features
//! - Seeded synthetic LiDAR / radar / GPS sensors (reproducible runs)
//! - Collision short-circuit that freezes the filters for the tick
//! - Non-finite measurements rejected per channel without stopping the loop
//! - Readers on other threads always see a whole tick: the loop swaps in
//!   complete snapshots
//!
//! ## Architecture
//!
//! ```text
//! SensorSimulator ──► ScalarEstimator (range) ──┐
//!        │                                      ├──► CollisionRiskEvaluator ──► SimulationSnapshot
//!        └──────────► ScalarEstimator (speed) ──┘                                  │
//!                                                                 HUD / telemetry consumers
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod estimator;
pub mod risk;
pub mod sensors;
pub mod simulation;
pub mod snapshot;
pub mod world;

pub use clock::{Clock, ManualClock, StopHandle, SystemClock};
pub use config::SimulationConfig;
pub use error::{FcaError, Result};
pub use estimator::ScalarEstimator;
pub use risk::{compute_ttc, CollisionRiskEvaluator, Decision, TickResult};
pub use sensors::{MeasurementSource, SensorReading, SensorSimulator};
pub use simulation::{RunSummary, Simulation};
pub use snapshot::{SimState, SimulationSnapshot, SnapshotReader};
pub use world::{Obstacle, ObstacleField};
