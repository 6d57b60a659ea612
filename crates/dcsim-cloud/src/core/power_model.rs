//! Creation of host power models from config strings.

use dcsim_models::power::models::{
    ConstantPowerModel, CubicPowerModel, LinearPowerModel, SqrtPowerModel, SquarePowerModel,
};
use dcsim_models::power::PowerModel;

use crate::core::config::error::ConfigError;
use crate::core::config::options::{parse_config_value, parse_options, require_option};

/// Creates power model from string in `Name[options]` format.
///
/// Supported values are `Linear`, `Square`, `Cubic` and `Sqrt` with options `max` (power in W at full load) and
/// `static` (fraction of `max` consumed by idle host), and `Constant[power=..]`.
pub fn power_model_resolver(config_str: &str) -> Result<Box<dyn PowerModel>, ConfigError> {
    let (name, options) = parse_config_value(config_str);
    let options = parse_options(&options.unwrap_or_default());
    if name == "Constant" {
        let power = require_option(&options, &name, "power")?;
        return Ok(Box::new(ConstantPowerModel::new(power)?));
    }
    let limits = || -> Result<(f64, f64), ConfigError> {
        Ok((require_option(&options, &name, "max")?, require_option(&options, &name, "static")?))
    };
    let model: Box<dyn PowerModel> = match name.as_str() {
        "Linear" => {
            let (max, static_percent) = limits()?;
            Box::new(LinearPowerModel::new(max, static_percent)?)
        }
        "Square" => {
            let (max, static_percent) = limits()?;
            Box::new(SquarePowerModel::new(max, static_percent)?)
        }
        "Cubic" => {
            let (max, static_percent) = limits()?;
            Box::new(CubicPowerModel::new(max, static_percent)?)
        }
        "Sqrt" => {
            let (max, static_percent) = limits()?;
            Box::new(SqrtPowerModel::new(max, static_percent)?)
        }
        _ => return Err(ConfigError::UnknownPowerModel(config_str.to_string())),
    };
    Ok(model)
}
