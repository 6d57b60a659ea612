//! Datacenter model: hosts, virtual machines, cloudlets and the policies placing them.

pub mod allocation_policy;
pub mod broker;
pub mod cloudlet;
pub mod cloudlet_scheduler;
pub mod common;
pub mod config;
pub mod datacenter;
pub mod datacenter_storage;
pub mod energy_meter;
pub mod events;
pub mod host;
pub mod migration;
pub mod pe;
pub mod placement_strategies;
pub mod placement_strategy;
pub mod power_model;
pub mod processor;
pub mod resource_provisioner;
pub mod vm;
pub mod vm_scheduler;
