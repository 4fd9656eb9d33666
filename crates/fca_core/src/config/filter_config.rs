//! Per-channel filter tuning

use serde::{Deserialize, Serialize};

use crate::error::{Channel, FcaError, Result};
use crate::estimator::ScalarEstimator;

/// Noise parameters for one scalar filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Model noise Q
    pub process_variance: f64,
    /// Sensor noise R
    pub measurement_variance: f64,
}

impl FilterConfig {
    /// LiDAR range channel (Q = 2.0, R = 10.0)
    pub fn range_default() -> Self {
        Self { process_variance: 2.0, measurement_variance: 10.0 }
    }

    /// Radar speed channel (Q = 1.0, R = 5.0)
    pub fn speed_default() -> Self {
        Self { process_variance: 1.0, measurement_variance: 5.0 }
    }

    /// Both variances must be finite and strictly positive.
    pub fn validate(&self, name: &str) -> Result<()> {
        if !self.process_variance.is_finite() || self.process_variance <= 0.0 {
            return Err(FcaError::InvalidConfig(format!(
                "{}.process_variance must be > 0, got {}",
                name, self.process_variance
            )));
        }
        if !self.measurement_variance.is_finite() || self.measurement_variance <= 0.0 {
            return Err(FcaError::InvalidConfig(format!(
                "{}.measurement_variance must be > 0, got {}",
                name, self.measurement_variance
            )));
        }
        Ok(())
    }

    pub fn build(&self, channel: Channel) -> Result<ScalarEstimator> {
        ScalarEstimator::for_channel(channel, self.process_variance, self.measurement_variance)
    }
}
