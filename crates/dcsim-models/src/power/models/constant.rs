//! Constant power model.

use crate::error::ModelError;
use crate::power::power_model::PowerModel;

/// Power consumption does not depend on the utilization.
#[derive(Clone, Debug)]
pub struct ConstantPowerModel {
    power: f64,
}

impl ConstantPowerModel {
    /// Creates a constant power model.
    pub fn new(power: f64) -> Result<Self, ModelError> {
        if !(power >= 0.) {
            return Err(ModelError::InvalidParameter { name: "power", value: power });
        }
        Ok(Self { power })
    }
}

impl PowerModel for ConstantPowerModel {
    fn power(&self, _utilization: f64) -> f64 {
        self.power
    }
}
