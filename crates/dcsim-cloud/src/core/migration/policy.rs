//! Allocation policy which migrates VMs away from over-utilized hosts and consolidates under-utilized ones.

use std::collections::BTreeSet;

use crate::core::allocation_policy::{SimpleVmAllocationPolicy, VmAllocationPolicy};
use crate::core::common::{HostId, PlacementResult};
use crate::core::host::{find_host, find_host_mut, Host};
use crate::core::migration::threshold::ThresholdDetector;
use crate::core::migration::vm_selection::VmSelectionStrategy;
use crate::core::migration::{MigrationEntry, MigrationMap};
use crate::core::placement_strategy::PlacementStrategy;
use crate::core::vm::{Vm, VmRef};

/// Composes a placement strategy, a threshold detector and a VM selection strategy.
///
/// New VMs and migrated VMs are placed with the strategy on hosts which stay not over-utilized after the placement.
/// Migration planning works on a copy of the hosts, so each planned placement sees the placements planned before it
/// in the same pass.
#[derive(Clone)]
pub struct MigrationVmAllocationPolicy {
    base: SimpleVmAllocationPolicy,
    detector: Box<dyn ThresholdDetector>,
    selection: Box<dyn VmSelectionStrategy>,
}

impl MigrationVmAllocationPolicy {
    pub fn new(
        strategy: Box<dyn PlacementStrategy>,
        detector: Box<dyn ThresholdDetector>,
        selection: Box<dyn VmSelectionStrategy>,
    ) -> Self {
        Self {
            base: SimpleVmAllocationPolicy::with_utilization_cap(strategy, detector.over_threshold()),
            detector,
            selection,
        }
    }

    pub fn is_host_over_utilized(&self, host: &Host, time: f64) -> bool {
        !host.is_failed() && self.detector.is_over_utilized(host.cpu_utilization(time))
    }

    /// Returns the under-utilized host with the lowest utilization, the first one in host order wins on ties.
    ///
    /// Excluded, inactive and failed hosts and hosts with migrating VMs are not considered.
    pub fn find_under_utilized_host(&self, hosts: &[Host], excluded: &BTreeSet<HostId>, time: f64) -> Option<HostId> {
        let mut result = None;
        let mut min_utilization = f64::MAX;
        for host in hosts {
            if excluded.contains(&host.id()) || !host.is_active() || host.is_failed() || host.has_migrating_vms() {
                continue;
            }
            let utilization = host.cpu_utilization(time);
            if self.detector.is_under_utilized(utilization) && utilization < min_utilization {
                min_utilization = utilization;
                result = Some(host.id());
            }
        }
        result
    }

    // Moves VM between hosts of the planning copy.
    fn apply(hosts: &mut [Host], vm: &VmRef, source: HostId, target: HostId) -> bool {
        let vm_id = vm.borrow().id();
        if let Some(host) = find_host_mut(hosts, source) {
            host.destroy_vm(vm_id);
        }
        let placed = find_host_mut(hosts, target).map_or(false, |host| host.create_vm(vm));
        if !placed {
            if let Some(host) = find_host_mut(hosts, source) {
                host.create_vm(vm);
            }
        }
        placed
    }

    fn plan_over_utilized(
        &mut self,
        hosts: &mut [Host],
        over_hosts: &BTreeSet<HostId>,
        time: f64,
        map: &mut MigrationMap,
    ) {
        for &source in over_hosts {
            loop {
                let host = match find_host(hosts, source) {
                    Some(host) if self.is_host_over_utilized(host, time) => host,
                    _ => break,
                };
                let vm = match self.selection.select_vm(host, time) {
                    Some(vm) => vm,
                    None => break,
                };
                let mut excluded = over_hosts.clone();
                excluded.insert(source);
                let target = self.base.find_host_for_vm(&vm.borrow(), hosts, &excluded, time);
                // the selected VM stays, selecting again would give the same VM
                let target = match target {
                    Some(target) if Self::apply(hosts, &vm, source, target) => target,
                    _ => break,
                };
                map.entries.push(MigrationEntry { vm, source, target });
            }
        }
    }

    fn plan_under_utilized(
        &self,
        hosts: &mut Vec<Host>,
        over_hosts: &BTreeSet<HostId>,
        time: f64,
        map: &mut MigrationMap,
    ) {
        // targets of planned migrations are not consolidated in the same pass
        let mut considered = over_hosts.clone();
        considered.extend(map.entries.iter().map(|e| e.target));
        while let Some(source) = self.find_under_utilized_host(hosts, &considered, time) {
            considered.insert(source);
            let mut excluded = considered.clone();
            for host in hosts.iter() {
                if !host.is_active() || host.cpu_utilization(time) == 0. {
                    excluded.insert(host.id());
                }
            }

            // all VMs of the host are moved or none of them
            let mut trial = hosts.clone();
            let vms = match find_host(&trial, source) {
                Some(host) => host.vms().to_vec(),
                None => continue,
            };
            let mut entries = Vec::with_capacity(vms.len());
            for vm in vms {
                if vm.borrow().is_in_migration() {
                    break;
                }
                let target = self.base.find_host_for_vm(&vm.borrow(), &trial, &excluded, time);
                match target {
                    Some(target) if Self::apply(&mut trial, &vm, source, target) => {
                        entries.push(MigrationEntry { vm, source, target });
                    }
                    _ => break,
                }
            }
            let emptied = find_host(&trial, source).map_or(false, |host| host.vms().is_empty());
            if emptied {
                considered.extend(entries.iter().map(|e| e.target));
                *hosts = trial;
                map.entries.extend(entries);
                map.hosts_to_deactivate.push(source);
            }
        }
    }
}

impl VmAllocationPolicy for MigrationVmAllocationPolicy {
    fn allocate_host_for_vm(&mut self, vm: &VmRef, hosts: &mut [Host], time: f64) -> PlacementResult {
        self.base.allocate_host_for_vm(vm, hosts, time)
    }

    fn allocate_host_for_vm_on(&mut self, vm: &VmRef, host_id: HostId, hosts: &mut [Host]) -> bool {
        self.base.allocate_host_for_vm_on(vm, host_id, hosts)
    }

    fn deallocate_host_for_vm(&mut self, vm: &VmRef, hosts: &mut [Host]) {
        self.base.deallocate_host_for_vm(vm, hosts)
    }

    fn find_host_for_vm(&self, vm: &Vm, hosts: &[Host], excluded: &BTreeSet<HostId>, time: f64) -> Option<HostId> {
        self.base.find_host_for_vm(vm, hosts, excluded, time)
    }

    fn host_of(&self, vm_id: u32) -> Option<HostId> {
        self.base.host_of(vm_id)
    }

    fn optimize_allocation(&mut self, hosts: &[Host], time: f64) -> MigrationMap {
        let mut planned = hosts.to_vec();
        let over_hosts: BTreeSet<HostId> = hosts
            .iter()
            .filter(|h| h.is_active() && self.is_host_over_utilized(h, time))
            .map(|h| h.id())
            .collect();
        let mut map = MigrationMap::default();
        self.plan_over_utilized(&mut planned, &over_hosts, time, &mut map);
        self.plan_under_utilized(&mut planned, &over_hosts, time, &mut map);
        map
    }
}
