//! Scalar Estimator
//!
//! Single-variable recursive Bayesian filter (1D Kalman filter with a
//! random-walk model). One instance smooths the LiDAR range channel, a
//! second one the radar speed channel.
//!
//! ## Usage
//! ```rust
//! use fca_core::estimator::ScalarEstimator;
//!
//! let mut range = ScalarEstimator::new(2.0, 10.0).unwrap();
//! let smoothed = range.update(18.4).unwrap();
//! assert!(smoothed > 0.0 && smoothed < 18.4);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Channel, FcaError, Result};

/// Initial estimate at simulation start
pub const INITIAL_ESTIMATE: f64 = 0.0;

/// Initial estimate variance at simulation start
pub const INITIAL_UNCERTAINTY: f64 = 1.0;

/// Recursive scalar filter state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarEstimator {
    /// Current best value
    estimate: f64,
    /// Current estimate variance
    uncertainty: f64,
    /// Model noise added on every predict step (Q)
    process_noise: f64,
    /// Sensor noise (R). Zero turns the filter into a passthrough.
    measurement_noise: f64,
    /// Channel label used in error reports
    channel: Channel,
}

impl ScalarEstimator {
    /// Create a filter for the range channel.
    ///
    /// # Errors
    /// `InvalidConfig` if either noise is negative or non-finite, or if
    /// `process_noise` is zero.
    pub fn new(process_noise: f64, measurement_noise: f64) -> Result<Self> {
        Self::for_channel(Channel::Range, process_noise, measurement_noise)
    }

    /// Create a filter labelled with the channel it smooths.
    pub fn for_channel(channel: Channel, process_noise: f64, measurement_noise: f64) -> Result<Self> {
        if !process_noise.is_finite() || process_noise <= 0.0 {
            return Err(FcaError::InvalidConfig(format!(
                "{} process noise must be finite and > 0, got {}",
                channel, process_noise
            )));
        }
        if !measurement_noise.is_finite() || measurement_noise < 0.0 {
            return Err(FcaError::InvalidConfig(format!(
                "{} measurement noise must be finite and >= 0, got {}",
                channel, measurement_noise
            )));
        }

        Ok(Self {
            estimate: INITIAL_ESTIMATE,
            uncertainty: INITIAL_UNCERTAINTY,
            process_noise,
            measurement_noise,
            channel,
        })
    }

    /// Fold one measurement into the estimate and return the new estimate.
    ///
    /// A non-finite measurement is rejected with `DegenerateMeasurement` and
    /// leaves the filter untouched (no predict step either).
    pub fn update(&mut self, measurement: f64) -> Result<f64> {
        if !measurement.is_finite() {
            return Err(FcaError::DegenerateMeasurement { channel: self.channel, value: measurement });
        }

        // Predict
        let predicted = self.uncertainty + self.process_noise;

        // Correct
        let gain = predicted / (predicted + self.measurement_noise);
        self.estimate += gain * (measurement - self.estimate);
        self.uncertainty = (1.0 - gain) * predicted;

        Ok(self.estimate)
    }

    /// Gain the next update will apply.
    pub fn gain(&self) -> f64 {
        let predicted = self.uncertainty + self.process_noise;
        predicted / (predicted + self.measurement_noise)
    }

    /// Steady-state variance the filter converges to under a constant
    /// measurement stream: `(-Q + sqrt(Q^2 + 4QR)) / 2`.
    pub fn steady_state_uncertainty(&self) -> f64 {
        let q = self.process_noise;
        let r = self.measurement_noise;
        (-q + (q * q + 4.0 * q * r).sqrt()) / 2.0
    }

    /// Back to the start-of-simulation state.
    pub fn reset(&mut self) {
        self.estimate = INITIAL_ESTIMATE;
        self.uncertainty = INITIAL_UNCERTAINTY;
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    pub fn uncertainty(&self) -> f64 {
        self.uncertainty
    }

    pub fn process_noise(&self) -> f64 {
        self.process_noise
    }

    pub fn measurement_noise(&self) -> f64 {
        self.measurement_noise
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }
}

// ========== Tests ==========
