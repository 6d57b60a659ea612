//! Config utils.

use std::collections::HashMap;
use std::str::FromStr;

use crate::core::config::error::ConfigError;

/// Parses config value string, which consists of two parts - name and options.
/// Example: Linear[max=250,static=0.7] parts are name Linear and options string "max=250,static=0.7".
pub fn parse_config_value(config_str: &str) -> (String, Option<String>) {
    match config_str.split_once('[') {
        Some((l, r)) => (l.trim().to_string(), Some(r.replace(']', ""))),
        None => (config_str.trim().to_string(), None),
    }
}

/// Parses options string from config value, returns map with option names and values.
///
/// # Examples
///
/// ```rust
/// use dcsim_cloud::core::config::options::parse_options;
///
/// let options = parse_options("over=0.8,selection=MinimumUtilization");
/// assert_eq!(options.get("over").unwrap(), "0.8");
/// assert_eq!(options.get("selection").unwrap(), "MinimumUtilization");
/// assert_eq!(options.get("under"), None);
/// ```
pub fn parse_options(options_str: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for option_str in options_str.split(',') {
        if let Some((name, value)) = option_str.split_once('=') {
            options.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    options
}

/// Returns parsed option value or `None` if the option is not set.
pub fn parse_option<T: FromStr>(options: &HashMap<String, String>, name: &str) -> Result<Option<T>, ConfigError> {
    match options.get(name) {
        Some(value) => value.parse::<T>().map(Some).map_err(|_| ConfigError::InvalidOption {
            name: name.to_string(),
            value: value.clone(),
        }),
        None => Ok(None),
    }
}

/// Returns parsed value of mandatory option.
pub fn require_option<T: FromStr>(
    options: &HashMap<String, String>,
    component: &str,
    name: &str,
) -> Result<T, ConfigError> {
    parse_option(options, name)?.ok_or_else(|| ConfigError::MissingOption {
        component: component.to_string(),
        name: name.to_string(),
    })
}
