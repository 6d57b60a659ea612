//! Configuration errors.

use std::fmt::{Display, Formatter};

use dcsim_models::error::ModelError;

/// Error of building a datacenter component from invalid parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Numeric parameter is outside of its valid range.
    InvalidValue { name: String, value: f64 },
    /// Option value cannot be parsed.
    InvalidOption { name: String, value: String },
    /// Mandatory option is not set.
    MissingOption { component: String, name: String },
    UnknownPolicy(String),
    UnknownPowerModel(String),
    UnknownVmSelection(String),
    DuplicateHost(u32),
    InvalidStorage(String),
    Model(ModelError),
}

impl ConfigError {
    pub(crate) fn invalid_value(name: &str, value: f64) -> Self {
        ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { name, value } => write!(f, "invalid value of {}: {}", name, value),
            ConfigError::InvalidOption { name, value } => write!(f, "invalid value of option {}: {}", name, value),
            ConfigError::MissingOption { component, name } => write!(f, "{} requires option {}", component, name),
            ConfigError::UnknownPolicy(s) => write!(f, "can't resolve VM allocation policy: {}", s),
            ConfigError::UnknownPowerModel(s) => write!(f, "can't resolve power model: {}", s),
            ConfigError::UnknownVmSelection(s) => write!(f, "can't resolve VM selection strategy: {}", s),
            ConfigError::DuplicateHost(id) => write!(f, "host with id {} already exists", id),
            ConfigError::InvalidStorage(s) => write!(f, "invalid storage: {}", s),
            ConfigError::Model(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ModelError> for ConfigError {
    fn from(e: ModelError) -> Self {
        ConfigError::Model(e)
    }
}
