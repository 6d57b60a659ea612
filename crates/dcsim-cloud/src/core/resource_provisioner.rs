//! Per-VM accounting of a host resource.

use indexmap::IndexMap;

use dcsim_models::resource::Resource;

/// Splits a host resource (RAM, bandwidth or storage) between VMs.
///
/// Each VM holds at most one allocation, a new allocation for the same VM replaces the previous one.
#[derive(Clone, Debug)]
pub struct ResourceProvisioner {
    resource: Resource,
    allocations: IndexMap<u32, u64>,
}

impl ResourceProvisioner {
    pub fn new(capacity: u64) -> Self {
        Self {
            resource: Resource::new(capacity),
            allocations: IndexMap::new(),
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn capacity(&self) -> u64 {
        self.resource.capacity()
    }

    pub fn available(&self) -> u64 {
        self.resource.available()
    }

    pub fn allocated_for_vm(&self, vm_id: u32) -> u64 {
        self.allocations.get(&vm_id).copied().unwrap_or(0)
    }

    /// Checks that the VM allocation can be replaced by `amount`.
    pub fn is_suitable_for_vm(&self, vm_id: u32, amount: u64) -> bool {
        self.resource.available() + self.allocated_for_vm(vm_id) >= amount
    }

    /// Replaces the VM allocation by `amount`, nothing changes on failure.
    pub fn allocate_for_vm(&mut self, vm_id: u32, amount: u64) -> bool {
        if !self.is_suitable_for_vm(vm_id, amount) {
            return false;
        }
        self.deallocate_for_vm(vm_id);
        if amount > 0 {
            self.resource.allocate(amount);
            self.allocations.insert(vm_id, amount);
        }
        true
    }

    /// Releases the VM allocation and returns the released amount.
    pub fn deallocate_for_vm(&mut self, vm_id: u32) -> u64 {
        match self.allocations.shift_remove(&vm_id) {
            Some(amount) => {
                self.resource.deallocate(amount);
                amount
            }
            None => 0,
        }
    }
}
