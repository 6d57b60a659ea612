//! Power model trait.

use dyn_clone::{clone_trait_object, DynClone};

use crate::error::ModelError;

/// A model for estimating the power consumption of a host based on its CPU utilization.
pub trait PowerModel: DynClone {
    /// Returns host power consumption in W.
    ///
    /// CPU utilization should be passed as a float in 0.0-1.0 range, values outside of it are clamped.
    fn power(&self, utilization: f64) -> f64;

    /// Returns energy in Ws consumed during `time_span` seconds while the utilization changed linearly
    /// from `from_utilization` to `to_utilization`.
    fn energy_linear_interpolation(&self, from_utilization: f64, to_utilization: f64, time_span: f64) -> f64 {
        let from_power = self.power(from_utilization);
        let to_power = self.power(to_utilization);
        (from_power + (to_power - from_power) / 2.) * time_span
    }
}

clone_trait_object!(PowerModel);

/// Parameters shared by the models which interpolate between static and maximum power.
#[derive(Clone, Debug)]
pub(crate) struct PowerRange {
    pub max_power: f64,
    pub static_power: f64,
}

impl PowerRange {
    pub fn new(max_power: f64, static_power_percent: f64) -> Result<Self, ModelError> {
        if !(max_power >= 0.) {
            return Err(ModelError::InvalidParameter {
                name: "max_power",
                value: max_power,
            });
        }
        if !(0. ..=1.).contains(&static_power_percent) {
            return Err(ModelError::InvalidParameter {
                name: "static_power_percent",
                value: static_power_percent,
            });
        }
        Ok(Self {
            max_power,
            static_power: max_power * static_power_percent,
        })
    }

    /// Static power plus the dynamic part scaled by `factor` in `[0, 1]`.
    pub fn interpolate(&self, factor: f64) -> f64 {
        self.static_power + (self.max_power - self.static_power) * factor
    }
}
