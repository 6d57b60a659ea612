//! Linear power model.

use crate::error::ModelError;
use crate::power::power_model::{PowerModel, PowerRange};

/// Power grows linearly from the static power to the maximum power with the utilization.
#[derive(Clone, Debug)]
pub struct LinearPowerModel {
    range: PowerRange,
}

impl LinearPowerModel {
    /// Creates a linear power model.
    ///
    /// * `max_power` - The power consumption in Watts at 100% utilization.
    /// * `static_power_percent` - The fraction of `max_power` consumed by an idle host, in 0.0-1.0 range.
    pub fn new(max_power: f64, static_power_percent: f64) -> Result<Self, ModelError> {
        Ok(Self {
            range: PowerRange::new(max_power, static_power_percent)?,
        })
    }

    /// Returns the power consumption at 100% utilization.
    pub fn max_power(&self) -> f64 {
        self.range.max_power
    }

    /// Returns the power consumption of an idle host.
    pub fn static_power(&self) -> f64 {
        self.range.static_power
    }
}

impl PowerModel for LinearPowerModel {
    fn power(&self, utilization: f64) -> f64 {
        let utilization = utilization.clamp(0., 1.);
        self.range.interpolate(utilization)
    }
}
