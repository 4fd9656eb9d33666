//! Published per-tick state
//!
//! The tick loop is the only writer. It builds a complete
//! `SimulationSnapshot` and swaps it in as a whole, so readers on other
//! threads always see one consistent tick.
//!
//! ```rust
//! use fca_core::snapshot::{SimulationSnapshot, SnapshotPublisher};
//!
//! let publisher = SnapshotPublisher::new();
//! let reader = publisher.reader();
//! assert!(reader.latest().is_none());
//!
//! publisher.publish(SimulationSnapshot::initial(Vec::new()));
//! assert_eq!(reader.latest().unwrap().tick, 0);
//! ```

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::risk::TickResult;
use crate::world::Obstacle;

/// Lifecycle of the tick loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimState {
    Running,
    Stopped,
}

/// Everything a display or logger needs for one refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Ticks completed so far
    pub tick: u64,
    /// Loop time at which the tick ran (s)
    pub elapsed_secs: f64,
    pub result: TickResult,
    /// Obstacle positions after this tick's advance
    pub obstacles: Vec<Obstacle>,
    pub state: SimState,
}

impl SimulationSnapshot {
    /// Snapshot visible before the first tick runs.
    pub fn initial(obstacles: Vec<Obstacle>) -> Self {
        Self {
            tick: 0,
            elapsed_secs: 0.0,
            result: TickResult::initial(),
            obstacles,
            state: SimState::Running,
        }
    }

    /// Derived flag for the braking indicator.
    pub fn braking(&self) -> bool {
        self.result.is_braking()
    }
}

type Slot = Arc<RwLock<Option<Arc<SimulationSnapshot>>>>;

/// Write side, held by the tick loop
#[derive(Debug, Default)]
pub struct SnapshotPublisher {
    slot: Slot,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published snapshot.
    pub fn publish(&self, snapshot: SimulationSnapshot) {
        let next = Arc::new(snapshot);
        let mut guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(next);
    }

    /// Mark the latest snapshot as stopped without touching its tick data.
    pub fn publish_stopped(&self) {
        let mut guard = self.slot.write().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = guard.as_ref() {
            let mut stopped = SimulationSnapshot::clone(current);
            stopped.state = SimState::Stopped;
            *guard = Some(Arc::new(stopped));
        }
    }

    pub fn reader(&self) -> SnapshotReader {
        SnapshotReader { slot: Arc::clone(&self.slot) }
    }
}

/// Read side, cloneable across threads
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    slot: Slot,
}

impl SnapshotReader {
    /// Most recently published snapshot, if any.
    pub fn latest(&self) -> Option<Arc<SimulationSnapshot>> {
        let guard = self.slot.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    /// Tick number of the latest snapshot (0 before the first tick).
    pub fn latest_tick(&self) -> u64 {
        self.latest().map(|s| s.tick).unwrap_or(0)
    }
}
