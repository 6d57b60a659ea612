//! VM allocation policies.

use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::core::common::{HostId, PlacementResult};
use crate::core::config::error::ConfigError;
use crate::core::config::options::{parse_config_value, parse_option, parse_options};
use crate::core::host::{find_host_mut, Host};
use crate::core::migration::policy::MigrationVmAllocationPolicy;
use crate::core::migration::threshold::StaticThreshold;
use crate::core::migration::vm_selection::vm_selection_resolver;
use crate::core::migration::MigrationMap;
use crate::core::placement_strategy::{placement_strategy_resolver, PlacementStrategy};
use crate::core::vm::{Vm, VmRef, VmStatus};

pub const DEFAULT_OVER_UTILIZATION_THRESHOLD: f64 = 0.8;
pub const DEFAULT_UNDER_UTILIZATION_THRESHOLD: f64 = 0.2;

/// Trait for implementation of VM allocation policies.
///
/// The policy decides which host runs each VM and keeps the VM to host mapping. It is the only component which
/// reserves and releases host resources on behalf of VMs. Hosts are owned by the datacenter and passed in on every
/// call.
pub trait VmAllocationPolicy {
    /// Searches a suitable host for the VM and places it there.
    fn allocate_host_for_vm(&mut self, vm: &VmRef, hosts: &mut [Host], time: f64) -> PlacementResult;

    /// Places the VM on the given host, fails if the host cannot fit it.
    fn allocate_host_for_vm_on(&mut self, vm: &VmRef, host_id: HostId, hosts: &mut [Host]) -> bool;

    /// Releases resources held by the VM on its host. Does nothing for a VM which is not placed.
    fn deallocate_host_for_vm(&mut self, vm: &VmRef, hosts: &mut [Host]);

    /// Searches a suitable host for the VM without placing it.
    fn find_host_for_vm(&self, vm: &Vm, hosts: &[Host], excluded: &BTreeSet<HostId>, time: f64) -> Option<HostId>;

    /// Returns the host of the placed VM.
    fn host_of(&self, vm_id: u32) -> Option<HostId>;

    /// Returns a plan of VM migrations improving the current allocation.
    fn optimize_allocation(&mut self, _hosts: &[Host], _time: f64) -> MigrationMap {
        MigrationMap::default()
    }
}

/// Returns the first host in the strategy order which fits the VM.
///
/// With `utilization_cap` set, hosts whose CPU utilization would exceed it after adding the VM's current demand are
/// skipped.
pub fn select_host(
    strategy: &dyn PlacementStrategy,
    vm: &Vm,
    hosts: &[Host],
    excluded: &BTreeSet<HostId>,
    time: f64,
    utilization_cap: Option<f64>,
) -> Option<HostId> {
    let demand = vm.cpu_utilization_mips(time);
    for idx in strategy.order_hosts(hosts, time) {
        let host = &hosts[idx];
        if excluded.contains(&host.id()) || !host.is_suitable_for_vm(vm) {
            continue;
        }
        if let Some(cap) = utilization_cap {
            let utilization_after = (host.cpu_utilization_mips(time) + demand) / host.total_mips() as f64;
            if utilization_after > cap {
                continue;
            }
        }
        return Some(host.id());
    }
    None
}

/// Places VMs with a placement strategy, never migrates them.
#[derive(Clone)]
pub struct SimpleVmAllocationPolicy {
    strategy: Box<dyn PlacementStrategy>,
    utilization_cap: Option<f64>,
    placements: IndexMap<u32, HostId>,
}

impl SimpleVmAllocationPolicy {
    pub fn new(strategy: Box<dyn PlacementStrategy>) -> Self {
        Self {
            strategy,
            utilization_cap: None,
            placements: IndexMap::new(),
        }
    }

    /// Creates policy which keeps host CPU utilization not above `cap` after a placement.
    pub fn with_utilization_cap(strategy: Box<dyn PlacementStrategy>, cap: f64) -> Self {
        Self {
            strategy,
            utilization_cap: Some(cap),
            placements: IndexMap::new(),
        }
    }

    pub fn placements(&self) -> &IndexMap<u32, HostId> {
        &self.placements
    }
}

impl VmAllocationPolicy for SimpleVmAllocationPolicy {
    fn allocate_host_for_vm(&mut self, vm: &VmRef, hosts: &mut [Host], time: f64) -> PlacementResult {
        let host_id = self.find_host_for_vm(&vm.borrow(), hosts, &BTreeSet::new(), time);
        match host_id {
            Some(host_id) if self.allocate_host_for_vm_on(vm, host_id, hosts) => PlacementResult::Placed(host_id),
            _ => PlacementResult::NoSuitableHost,
        }
    }

    fn allocate_host_for_vm_on(&mut self, vm: &VmRef, host_id: HostId, hosts: &mut [Host]) -> bool {
        let vm_id = vm.borrow().id();
        if self.placements.contains_key(&vm_id) {
            return false;
        }
        let host = match find_host_mut(hosts, host_id) {
            Some(host) => host,
            None => return false,
        };
        if !host.create_vm(vm) {
            return false;
        }
        self.placements.insert(vm_id, host_id);
        let mut vm = vm.borrow_mut();
        vm.set_host(Some(host_id));
        vm.set_status(VmStatus::Allocated);
        true
    }

    fn deallocate_host_for_vm(&mut self, vm: &VmRef, hosts: &mut [Host]) {
        let vm_id = vm.borrow().id();
        if let Some(host_id) = self.placements.shift_remove(&vm_id) {
            if let Some(host) = find_host_mut(hosts, host_id) {
                host.destroy_vm(vm_id);
            }
            vm.borrow_mut().set_host(None);
        }
    }

    fn find_host_for_vm(&self, vm: &Vm, hosts: &[Host], excluded: &BTreeSet<HostId>, time: f64) -> Option<HostId> {
        select_host(self.strategy.as_ref(), vm, hosts, excluded, time, self.utilization_cap)
    }

    fn host_of(&self, vm_id: u32) -> Option<HostId> {
        self.placements.get(&vm_id).copied()
    }
}

/// Creates allocation policy from string in `Name[options]` format.
///
/// Supported values are `FirstFit`, `BestFit`, `WorstFit` and
/// `Migration<Placement>[over=0.8,under=0.2,selection=MinimumUtilization,seed=1]` where `Placement` is one of the
/// former. The `seed` of random VM selection defaults to `default_seed`.
pub fn vm_allocation_policy_resolver(
    config_str: &str,
    default_seed: u64,
) -> Result<Box<dyn VmAllocationPolicy>, ConfigError> {
    let (name, options) = parse_config_value(config_str);
    let unknown = || ConfigError::UnknownPolicy(config_str.to_string());
    match name.strip_prefix("Migration<").and_then(|s| s.strip_suffix('>')) {
        Some(placement) => {
            let strategy = placement_strategy_resolver(placement).ok_or_else(unknown)?;
            let options = parse_options(&options.unwrap_or_default());
            let over = parse_option(&options, "over")?.unwrap_or(DEFAULT_OVER_UTILIZATION_THRESHOLD);
            let under = parse_option(&options, "under")?.unwrap_or(DEFAULT_UNDER_UTILIZATION_THRESHOLD);
            let seed = parse_option(&options, "seed")?.unwrap_or(default_seed);
            let selection_name = options
                .get("selection")
                .map(String::as_str)
                .unwrap_or("MinimumUtilization");
            let selection = vm_selection_resolver(selection_name, seed)?;
            let detector = StaticThreshold::new(over, under)?;
            Ok(Box::new(MigrationVmAllocationPolicy::new(
                strategy,
                Box::new(detector),
                selection,
            )))
        }
        None => {
            let strategy = placement_strategy_resolver(&name).ok_or_else(unknown)?;
            Ok(Box::new(SimpleVmAllocationPolicy::new(strategy)))
        }
    }
}
