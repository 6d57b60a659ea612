//! Datacenter configuration.

use serde::{Deserialize, Serialize};

use crate::core::config::error::ConfigError;

#[derive(Debug, Default, PartialEq, Serialize, Deserialize, Clone)]
struct RawDatacenterConfig {
    pub scheduling_interval: Option<f64>,
    pub min_time_between_events: Option<f64>,
    pub migrations_enabled: Option<bool>,
    pub migration_retry_delay: Option<f64>,
    pub bandwidth_percent_for_migration: Option<f64>,
    pub vm_allocation_policy: Option<String>,
    pub hosts: Option<Vec<HostConfig>>,
    pub storages: Option<Vec<StorageConfig>>,
}

/// Group of identical hosts.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct HostConfig {
    /// Host name, used when `count` is not set.
    pub name: Option<String>,
    /// Prefix of host names in the group, names are `{prefix}{index}`.
    pub name_prefix: Option<String>,
    pub count: Option<u32>,
    pub pes: u32,
    /// MIPS of each Pe.
    pub mips: u64,
    pub ram: u64,
    /// Bandwidth in bit/s.
    pub bw: u64,
    pub storage: u64,
    /// Power model in `Name[options]` format, e.g. `Linear[max=250,static=0.7]`.
    pub power_model: Option<String>,
}

impl HostConfig {
    /// Returns the names of hosts in the group.
    pub fn names(&self) -> Vec<String> {
        match self.count {
            Some(count) => {
                let prefix = self
                    .name_prefix
                    .clone()
                    .or_else(|| self.name.clone())
                    .unwrap_or_else(|| "host".to_string());
                (0..count).map(|i| format!("{}{}", prefix, i)).collect()
            }
            None => vec![self.name.clone().unwrap_or_else(|| "host".to_string())],
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    Harddrive,
    San,
}

/// Storage device of the datacenter.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    pub name: String,
    pub r#type: StorageType,
    /// Capacity in MB.
    pub capacity: u64,
    /// Disk transfer rate in MB/s.
    pub max_transfer_rate: Option<f64>,
    /// SAN network bandwidth in Mbit/s.
    pub bandwidth: Option<f64>,
    /// SAN network latency in seconds.
    pub network_latency: Option<f64>,
}

/// Datacenter configuration.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
pub struct DatacenterConfig {
    /// Period of resource usage updates, zero means updates only when cloudlets finish.
    pub scheduling_interval: f64,
    /// Minimal delay between processing updates.
    pub min_time_between_events: f64,
    pub migrations_enabled: bool,
    /// Minimal time between two consecutive migration plans.
    pub migration_retry_delay: f64,
    /// Fraction of the target host bandwidth used for VM migration.
    pub bandwidth_percent_for_migration: f64,
    /// VM allocation policy in `Name[options]` format.
    pub vm_allocation_policy: String,
    pub hosts: Vec<HostConfig>,
    pub storages: Vec<StorageConfig>,
}

impl Default for DatacenterConfig {
    fn default() -> Self {
        Self::from_raw(RawDatacenterConfig::default())
    }
}

impl DatacenterConfig {
    /// Creates datacenter config by reading parameter values from YAML file
    /// (uses default values if some parameters are absent).
    pub fn from_file(file_name: &str) -> Self {
        Self::from_yaml(
            &std::fs::read_to_string(file_name).unwrap_or_else(|_| panic!("Can't read file {}", file_name)),
        )
        .unwrap_or_else(|_| panic!("Can't parse YAML from file {}", file_name))
    }

    /// Creates datacenter config from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let raw: RawDatacenterConfig = serde_yaml::from_str(yaml)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawDatacenterConfig) -> Self {
        Self {
            scheduling_interval: raw.scheduling_interval.unwrap_or(0.),
            min_time_between_events: raw.min_time_between_events.unwrap_or(0.01),
            migrations_enabled: raw.migrations_enabled.unwrap_or(false),
            migration_retry_delay: raw.migration_retry_delay.unwrap_or(0.),
            bandwidth_percent_for_migration: raw.bandwidth_percent_for_migration.unwrap_or(0.5),
            vm_allocation_policy: raw.vm_allocation_policy.unwrap_or_else(|| "FirstFit".to_string()),
            hosts: raw.hosts.unwrap_or_default(),
            storages: raw.storages.unwrap_or_default(),
        }
    }

    /// Checks parameter values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("scheduling_interval", self.scheduling_interval),
            ("min_time_between_events", self.min_time_between_events),
            ("migration_retry_delay", self.migration_retry_delay),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.) || !value.is_finite() {
                return Err(ConfigError::invalid_value(name, value));
            }
        }
        let bw_percent = self.bandwidth_percent_for_migration;
        if !(bw_percent > 0. && bw_percent <= 1.) {
            return Err(ConfigError::invalid_value("bandwidth_percent_for_migration", bw_percent));
        }
        for storage in &self.storages {
            if storage.r#type == StorageType::San && storage.bandwidth.is_none() {
                return Err(ConfigError::InvalidStorage(format!(
                    "SAN storage {} requires bandwidth",
                    storage.name
                )));
            }
        }
        Ok(())
    }
}
