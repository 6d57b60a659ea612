//! Physical host running VMs.

use std::collections::BTreeSet;
use std::rc::Rc;

use dcsim_models::power::PowerModel;

use crate::core::common::HostId;
use crate::core::pe::Pe;
use crate::core::resource_provisioner::ResourceProvisioner;
use crate::core::vm::{Vm, VmRef};
use crate::core::vm_scheduler::VmScheduler;

/// Physical machine offering Pes, RAM, bandwidth and storage to VMs.
///
/// The host only keeps the accounting of its resources, VM state (status, location) is managed by the allocation
/// policy. Cloning a host gives an independent copy of the accounting which shares the VMs, this is how
/// migration planning tries placements without touching the real hosts.
#[derive(Clone)]
pub struct Host {
    id: HostId,
    name: String,
    vm_scheduler: VmScheduler,
    ram: ResourceProvisioner,
    bw: ResourceProvisioner,
    storage: ResourceProvisioner,
    vms: Vec<VmRef>,
    vms_migrating_in: Vec<VmRef>,
    vms_migrating_out: BTreeSet<u32>,
    failed: bool,
    active: bool,
    power_model: Option<Box<dyn PowerModel>>,
    previous_utilization: f64,
}

impl Host {
    pub fn new(id: HostId, name: &str, pes: Vec<Pe>, ram: u64, bw: u64, storage: u64) -> Self {
        Self {
            id,
            name: name.to_string(),
            vm_scheduler: VmScheduler::new(pes),
            ram: ResourceProvisioner::new(ram),
            bw: ResourceProvisioner::new(bw),
            storage: ResourceProvisioner::new(storage),
            vms: Vec::new(),
            vms_migrating_in: Vec::new(),
            vms_migrating_out: BTreeSet::new(),
            failed: false,
            active: true,
            power_model: None,
            previous_utilization: 0.,
        }
    }

    pub fn with_power_model(mut self, power_model: Box<dyn PowerModel>) -> Self {
        self.power_model = Some(power_model);
        self
    }

    pub fn id(&self) -> HostId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pes(&self) -> &[Pe] {
        self.vm_scheduler.pes()
    }

    pub fn vm_scheduler(&self) -> &VmScheduler {
        &self.vm_scheduler
    }

    pub fn total_mips(&self) -> u64 {
        self.vm_scheduler.total_mips()
    }

    pub fn ram(&self) -> &ResourceProvisioner {
        &self.ram
    }

    pub fn bw(&self) -> &ResourceProvisioner {
        &self.bw
    }

    pub fn storage(&self) -> &ResourceProvisioner {
        &self.storage
    }

    pub fn vms(&self) -> &[VmRef] {
        &self.vms
    }

    pub fn vm(&self, vm_id: u32) -> Option<VmRef> {
        self.vms.iter().find(|vm| vm.borrow().id() == vm_id).cloned()
    }

    pub fn vms_migrating_in(&self) -> &[VmRef] {
        &self.vms_migrating_in
    }

    pub fn is_migrating_out(&self, vm_id: u32) -> bool {
        self.vms_migrating_out.contains(&vm_id)
    }

    /// Checks whether any VM is being migrated to or from this host.
    pub fn has_migrating_vms(&self) -> bool {
        !self.vms_migrating_in.is_empty()
            || !self.vms_migrating_out.is_empty()
            || self.vms.iter().any(|vm| vm.borrow().is_in_migration())
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Checks that the VM fits on the host as a whole: Pes, RAM, bandwidth and storage.
    ///
    /// Does not change anything, so a negative answer never leaves partial allocations behind.
    pub fn is_suitable_for_vm(&self, vm: &Vm) -> bool {
        !self.failed
            && self.vm_scheduler.is_suitable_for_vm(vm.id(), vm.pes(), vm.mips())
            && self.ram.is_suitable_for_vm(vm.id(), vm.ram())
            && self.bw.is_suitable_for_vm(vm.id(), vm.bw())
            && self.storage.is_suitable_for_vm(vm.id(), vm.size())
    }

    // reservation is done only after the whole tuple was checked
    fn reserve(&mut self, vm: &Vm) -> bool {
        if !self.is_suitable_for_vm(vm) {
            return false;
        }
        let reserved = self.storage.allocate_for_vm(vm.id(), vm.size())
            && self.ram.allocate_for_vm(vm.id(), vm.ram())
            && self.bw.allocate_for_vm(vm.id(), vm.bw())
            && self.vm_scheduler.allocate_pes_for_vm(vm.id(), vm.pes(), vm.mips());
        if !reserved {
            self.release(vm.id());
        }
        reserved
    }

    fn release(&mut self, vm_id: u32) {
        self.storage.deallocate_for_vm(vm_id);
        self.ram.deallocate_for_vm(vm_id);
        self.bw.deallocate_for_vm(vm_id);
        self.vm_scheduler.deallocate_pes_for_vm(vm_id);
    }

    /// Reserves resources for the VM and starts hosting it.
    pub fn create_vm(&mut self, vm: &VmRef) -> bool {
        if !self.reserve(&vm.borrow()) {
            return false;
        }
        self.vms.push(vm.clone());
        self.active = true;
        true
    }

    /// Stops hosting the VM and releases its resources.
    pub fn destroy_vm(&mut self, vm_id: u32) -> Option<VmRef> {
        let pos = self.vms.iter().position(|vm| vm.borrow().id() == vm_id)?;
        self.release(vm_id);
        self.vms_migrating_out.remove(&vm_id);
        Some(self.vms.remove(pos))
    }

    /// Reserves resources for a VM which is going to be migrated to this host.
    pub fn add_migrating_in_vm(&mut self, vm: &VmRef) -> bool {
        if self.vms_migrating_in.iter().any(|v| Rc::ptr_eq(v, vm)) || !self.reserve(&vm.borrow()) {
            return false;
        }
        self.vms_migrating_in.push(vm.clone());
        self.active = true;
        true
    }

    /// Drops the reservation of a VM migrating to this host.
    pub fn remove_migrating_in_vm(&mut self, vm_id: u32) -> bool {
        match self.vms_migrating_in.iter().position(|vm| vm.borrow().id() == vm_id) {
            Some(pos) => {
                self.vms_migrating_in.remove(pos);
                self.release(vm_id);
                true
            }
            None => false,
        }
    }

    pub fn mark_migrating_out(&mut self, vm_id: u32) {
        self.vms_migrating_out.insert(vm_id);
    }

    /// MIPS granted to the VM on each of its Pes.
    pub fn allocated_mips_for_vm(&self, vm_id: u32) -> Vec<f64> {
        self.vm_scheduler.allocated_mips_for_vm(vm_id)
    }

    /// MIPS requested by hosted VMs and VMs migrating in.
    pub fn cpu_utilization_mips(&self, time: f64) -> f64 {
        self.vms
            .iter()
            .chain(self.vms_migrating_in.iter())
            .map(|vm| vm.borrow().cpu_utilization_mips(time))
            .sum()
    }

    /// Fraction of the host MIPS requested by its VMs.
    pub fn cpu_utilization(&self, time: f64) -> f64 {
        let total = self.total_mips();
        if total == 0 {
            return 0.;
        }
        self.cpu_utilization_mips(time) / total as f64
    }

    /// Updates processing of hosted VMs and returns the delay until the next cloudlet completion.
    pub fn update_processing(&mut self, time: f64) -> Option<f64> {
        let mut next_delay: Option<f64> = None;
        for vm in self.vms.iter() {
            let vm_id = vm.borrow().id();
            let share = self.vm_scheduler.allocated_mips_for_vm(vm_id);
            if let Some(delay) = vm.borrow_mut().update_processing(time, &share) {
                next_delay = Some(next_delay.map_or(delay, |d| d.min(delay)));
            }
        }
        next_delay
    }

    pub fn previous_utilization(&self) -> f64 {
        self.previous_utilization
    }

    pub fn set_previous_utilization(&mut self, utilization: f64) {
        self.previous_utilization = utilization;
    }

    /// Energy consumed during `time_span` while the utilization changed from `from` to `to`.
    ///
    /// Hosts without power model, failed or inactive hosts consume nothing.
    pub fn energy_linear_interpolation(&self, from: f64, to: f64, time_span: f64) -> f64 {
        match &self.power_model {
            Some(model) if self.active && !self.failed => model.energy_linear_interpolation(from, to, time_span),
            _ => 0.,
        }
    }

    pub fn power(&self, utilization: f64) -> f64 {
        match &self.power_model {
            Some(model) if self.active && !self.failed => model.power(utilization),
            _ => 0.,
        }
    }

    /// Marks Pe as failed. When all Pes have failed the host fails too, returns whether it happened.
    pub fn fail_pe(&mut self, pe_id: u32) -> bool {
        if !self.vm_scheduler.fail_pe(pe_id) {
            return false;
        }
        if self.vm_scheduler.all_pes_failed() {
            self.failed = true;
        }
        self.failed
    }
}

pub fn find_host(hosts: &[Host], id: HostId) -> Option<&Host> {
    hosts.iter().find(|h| h.id() == id)
}

pub fn find_host_mut(hosts: &mut [Host], id: HostId) -> Option<&mut Host> {
    hosts.iter_mut().find(|h| h.id() == id)
}
