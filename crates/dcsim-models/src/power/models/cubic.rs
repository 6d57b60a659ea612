//! Cubic power model.

use crate::error::ModelError;
use crate::power::power_model::{PowerModel, PowerRange};

/// Dynamic power grows with the cube of the utilization.
#[derive(Clone, Debug)]
pub struct CubicPowerModel {
    range: PowerRange,
}

impl CubicPowerModel {
    /// Creates a cubic power model.
    ///
    /// * `max_power` - The power consumption in Watts at 100% utilization.
    /// * `static_power_percent` - The fraction of `max_power` consumed by an idle host, in 0.0-1.0 range.
    pub fn new(max_power: f64, static_power_percent: f64) -> Result<Self, ModelError> {
        Ok(Self {
            range: PowerRange::new(max_power, static_power_percent)?,
        })
    }
}

impl PowerModel for CubicPowerModel {
    fn power(&self, utilization: f64) -> f64 {
        let utilization = utilization.clamp(0., 1.);
        self.range.interpolate(utilization.powi(3))
    }
}
