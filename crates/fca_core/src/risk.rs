//! Collision Risk Evaluation
//!
//! Turns filtered range and closing speed into a time-to-collision and a
//! discrete decision.
//!
//! ## Decision precedence
//! 1. true nearest range `< collision_distance` → `Collision`
//! 2. `ttc < safe_ttc_threshold` → `Brake`
//! 3. otherwise → `Safe`
//!
//! The TTC comparison is strict, so a TTC exactly at the threshold is `Safe`.

use serde::{Deserialize, Serialize};

/// Closing speeds below this are clamped before dividing (m/s).
pub const MIN_CLOSING_SPEED: f64 = 0.1;

/// Per-tick decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Safe,
    Brake,
    Collision,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Safe => "SAFE",
            Decision::Brake => "BRAKE",
            Decision::Collision => "COLLISION",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickResult {
    /// True nearest-obstacle absolute range (m)
    pub distance: f64,
    /// Smoothed LiDAR range (m)
    pub filtered_distance: f64,
    /// Ego speed minus smoothed target speed (m/s), before clamping
    pub filtered_relative_speed: f64,
    /// Ego speed reported by GPS (m/s)
    pub ego_speed: f64,
    /// Time to collision (s); 0.0 on collision ticks
    pub ttc: f64,
    pub decision: Decision,
    /// A measurement was rejected this tick and a previous estimate reused
    #[serde(default)]
    pub degraded: bool,
}

impl TickResult {
    pub fn is_braking(&self) -> bool {
        self.decision == Decision::Brake
    }

    /// Result published before the first tick.
    pub fn initial() -> Self {
        Self {
            distance: 0.0,
            filtered_distance: 0.0,
            filtered_relative_speed: 0.0,
            ego_speed: 0.0,
            ttc: 0.0,
            decision: Decision::Safe,
            degraded: false,
        }
    }
}

/// `distance / max(relative_speed, MIN_CLOSING_SPEED)`
///
/// The clamp keeps the result finite and non-inverted when the obstacle is
/// not closing.
pub fn compute_ttc(filtered_distance: f64, filtered_relative_speed: f64) -> f64 {
    let relative_speed = filtered_relative_speed.max(MIN_CLOSING_SPEED);
    filtered_distance / relative_speed
}

/// Threshold policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionRiskEvaluator {
    pub collision_distance: f64,
    pub safe_ttc_threshold: f64,
}

impl CollisionRiskEvaluator {
    pub fn new(collision_distance: f64, safe_ttc_threshold: f64) -> Self {
        Self { collision_distance, safe_ttc_threshold }
    }

    pub fn is_collision(&self, raw_distance: f64) -> bool {
        raw_distance < self.collision_distance
    }

    /// TTC-only part of the policy.
    pub fn classify_ttc(&self, ttc: f64) -> Decision {
        if ttc < self.safe_ttc_threshold {
            Decision::Brake
        } else {
            Decision::Safe
        }
    }

    /// Collision result carrying the frozen filter values, or `None` if the
    /// range is clear. `ego_speed` is the raw GPS reading of this tick.
    pub fn check_collision(
        &self,
        raw_distance: f64,
        frozen_distance: f64,
        frozen_relative_speed: f64,
        ego_speed: f64,
    ) -> Option<TickResult> {
        if !self.is_collision(raw_distance) {
            return None;
        }
        Some(TickResult {
            distance: raw_distance,
            filtered_distance: frozen_distance,
            filtered_relative_speed: frozen_relative_speed,
            ego_speed,
            ttc: 0.0,
            decision: Decision::Collision,
            degraded: false,
        })
    }

    /// Full policy, evaluated in precedence order.
    pub fn evaluate(
        &self,
        raw_distance: f64,
        filtered_distance: f64,
        filtered_relative_speed: f64,
        ego_speed: f64,
    ) -> TickResult {
        if let Some(result) =
            self.check_collision(raw_distance, filtered_distance, filtered_relative_speed, ego_speed)
        {
            return result;
        }

        let ttc = compute_ttc(filtered_distance, filtered_relative_speed);
        TickResult {
            distance: raw_distance,
            filtered_distance,
            filtered_relative_speed,
            ego_speed,
            ttc,
            decision: self.classify_ttc(ttc),
            degraded: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> CollisionRiskEvaluator {
        CollisionRiskEvaluator::new(2.0, 2.0)
    }

    #[test]
    fn test_ttc_basic() {
        assert!((compute_ttc(100.0, 25.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_ttc_speed_floor() {
        // Receding or stationary obstacles use the 0.1 m/s floor
        assert!((compute_ttc(10.0, -3.0) - 100.0).abs() < 1e-9);
        assert!((compute_ttc(10.0, 0.0) - 100.0).abs() < 1e-9);
        assert!(compute_ttc(10.0, -1e9).is_finite());
    }

    #[test]
    fn test_ttc_monotonic_in_distance() {
        let mut previous = f64::NEG_INFINITY;
        for d in [0.5, 1.0, 2.5, 10.0, 40.0, 120.0] {
            let ttc = compute_ttc(d, 5.0);
            assert!(ttc > previous);
            previous = ttc;
        }
    }

    #[test]
    fn test_threshold_equality_is_safe() {
        let result = evaluator().evaluate(10.0, 10.0, 5.0, 20.0);
        assert_eq!(result.ttc, 2.0);
        assert_eq!(result.decision, Decision::Safe);
    }

    #[test]
    fn test_below_threshold_brakes() {
        let result = evaluator().evaluate(9.9, 9.9, 5.0, 20.0);
        assert!(result.ttc < 2.0);
        assert_eq!(result.decision, Decision::Brake);
        assert!(result.is_braking());
    }

    #[test]
    fn test_collision_takes_precedence() {
        // Filtered values say "far and slow", raw range says otherwise
        let result = evaluator().evaluate(1.0, 50.0, 0.5, 20.0);
        assert_eq!(result.decision, Decision::Collision);
        assert_eq!(result.ttc, 0.0);
        assert_eq!(result.filtered_distance, 50.0);
    }

    #[test]
    fn test_check_collision_clear_range() {
        assert!(evaluator().check_collision(2.0, 10.0, 5.0, 20.0).is_none());
        assert!(evaluator().check_collision(1.99, 10.0, 5.0, 20.0).is_some());
    }

    #[test]
    fn test_decision_serialization() {
        assert_eq!(serde_json::to_string(&Decision::Brake).unwrap(), "\"BRAKE\"");
        let parsed: Decision = serde_json::from_str("\"COLLISION\"").unwrap();
        assert_eq!(parsed, Decision::Collision);
        assert_eq!(Decision::Safe.to_string(), "SAFE");
    }
}
