//! Sqrt power model.

use crate::error::ModelError;
use crate::power::power_model::{PowerModel, PowerRange};

/// Dynamic power grows with the square root of the utilization.
#[derive(Clone, Debug)]
pub struct SqrtPowerModel {
    range: PowerRange,
}

impl SqrtPowerModel {
    /// Creates a sqrt power model.
    ///
    /// * `max_power` - The power consumption in Watts at 100% utilization.
    /// * `static_power_percent` - The fraction of `max_power` consumed by an idle host, in 0.0-1.0 range.
    pub fn new(max_power: f64, static_power_percent: f64) -> Result<Self, ModelError> {
        Ok(Self {
            range: PowerRange::new(max_power, static_power_percent)?,
        })
    }
}

impl PowerModel for SqrtPowerModel {
    fn power(&self, utilization: f64) -> f64 {
        let utilization = utilization.clamp(0., 1.);
        self.range.interpolate(utilization.sqrt())
    }
}
