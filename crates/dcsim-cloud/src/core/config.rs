//! Datacenter configuration.

pub mod error;
pub mod options;
pub mod sim_config;

pub use error::ConfigError;
pub use options::{parse_config_value, parse_options};
pub use sim_config::{DatacenterConfig, HostConfig, StorageConfig, StorageType};
