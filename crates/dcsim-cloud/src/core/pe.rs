//! Processing element (CPU core) of a host.

use indexmap::IndexMap;
use serde::Serialize;

use dcsim_models::resource::Resource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PeStatus {
    Free,
    Busy,
    Failed,
}

/// Distributes MIPS of a single Pe between VMs.
#[derive(Clone, Debug)]
pub struct PeProvisioner {
    mips: Resource,
    allocations: IndexMap<u32, u64>,
}

impl PeProvisioner {
    pub fn new(mips: u64) -> Self {
        Self {
            mips: Resource::new(mips),
            allocations: IndexMap::new(),
        }
    }

    pub fn available_mips(&self) -> u64 {
        self.mips.available()
    }

    pub fn allocated_mips_for_vm(&self, vm_id: u32) -> u64 {
        self.allocations.get(&vm_id).copied().unwrap_or(0)
    }

    pub fn allocate_mips_for_vm(&mut self, vm_id: u32, mips: u64) -> bool {
        let current = self.allocated_mips_for_vm(vm_id);
        if self.mips.available() + current < mips {
            return false;
        }
        self.deallocate_mips_for_vm(vm_id);
        if mips > 0 {
            self.mips.allocate(mips);
            self.allocations.insert(vm_id, mips);
        }
        true
    }

    pub fn deallocate_mips_for_vm(&mut self, vm_id: u32) {
        if let Some(mips) = self.allocations.shift_remove(&vm_id) {
            self.mips.deallocate(mips);
        }
    }

    pub fn utilization(&self) -> f64 {
        self.mips.utilization()
    }

    fn is_allocated(&self) -> bool {
        self.mips.allocated() > 0
    }
}

/// Processing element: one core rated in MIPS.
///
/// A failed Pe keeps its allocations but is never used for new ones.
#[derive(Clone, Debug)]
pub struct Pe {
    id: u32,
    mips: u64,
    failed: bool,
    provisioner: PeProvisioner,
}

impl Pe {
    pub fn new(id: u32, mips: u64) -> Self {
        Self {
            id,
            mips,
            failed: false,
            provisioner: PeProvisioner::new(mips),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn mips(&self) -> u64 {
        self.mips
    }

    pub fn status(&self) -> PeStatus {
        if self.failed {
            PeStatus::Failed
        } else if self.provisioner.is_allocated() {
            PeStatus::Busy
        } else {
            PeStatus::Free
        }
    }

    /// Marks the Pe as failed or repaired. Free and busy states follow from the allocations.
    pub fn set_status(&mut self, status: PeStatus) {
        self.failed = status == PeStatus::Failed;
    }

    pub fn is_working(&self) -> bool {
        !self.failed
    }

    pub fn provisioner(&self) -> &PeProvisioner {
        &self.provisioner
    }

    pub fn provisioner_mut(&mut self) -> &mut PeProvisioner {
        &mut self.provisioner
    }
}

pub fn make_pes(count: u32, mips: u64) -> Vec<Pe> {
    (0..count).map(|id| Pe::new(id, mips)).collect()
}
