//! Detection of over- and under-utilized hosts.

use dyn_clone::{clone_trait_object, DynClone};

use crate::core::config::error::ConfigError;

/// Classifies host CPU utilization.
pub trait ThresholdDetector: DynClone {
    /// Utilization above which a host is over-utilized.
    fn over_threshold(&self) -> f64;

    fn is_over_utilized(&self, utilization: f64) -> bool;

    /// Idle hosts (zero utilization) are never under-utilized.
    fn is_under_utilized(&self, utilization: f64) -> bool;
}

clone_trait_object!(ThresholdDetector);

/// Fixed thresholds, both comparisons are strict.
#[derive(Clone, Debug)]
pub struct StaticThreshold {
    over: f64,
    under: f64,
}

impl StaticThreshold {
    /// Creates detector with `over` in (0, 1] and `under` in [0, over).
    pub fn new(over: f64, under: f64) -> Result<Self, ConfigError> {
        if !(over > 0. && over <= 1.) {
            return Err(ConfigError::invalid_value("over_utilization_threshold", over));
        }
        if !(under >= 0. && under < over) {
            return Err(ConfigError::invalid_value("under_utilization_threshold", under));
        }
        Ok(Self { over, under })
    }

    pub fn under_threshold(&self) -> f64 {
        self.under
    }
}

impl ThresholdDetector for StaticThreshold {
    fn over_threshold(&self) -> f64 {
        self.over
    }

    fn is_over_utilized(&self, utilization: f64) -> bool {
        utilization > self.over
    }

    fn is_under_utilized(&self, utilization: f64) -> bool {
        utilization > 0. && utilization < self.under
    }
}
