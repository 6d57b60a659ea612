//! Allocation of host Pes to VMs.

use crate::core::pe::{Pe, PeStatus};

/// Gives each VM the requested number of distinct working Pes with the requested MIPS on each of them.
#[derive(Clone, Debug)]
pub struct VmScheduler {
    pes: Vec<Pe>,
}

impl VmScheduler {
    pub fn new(pes: Vec<Pe>) -> Self {
        Self { pes }
    }

    pub fn pes(&self) -> &[Pe] {
        &self.pes
    }

    pub fn total_mips(&self) -> u64 {
        self.pes.iter().map(|pe| pe.mips()).sum()
    }

    /// Sum of unallocated MIPS on working Pes.
    pub fn available_mips(&self) -> u64 {
        self.working_pes().map(|pe| pe.provisioner().available_mips()).sum()
    }

    pub fn num_free_pes(&self) -> usize {
        self.pes.iter().filter(|pe| pe.status() == PeStatus::Free).count()
    }

    pub fn num_failed_pes(&self) -> usize {
        self.pes.iter().filter(|pe| !pe.is_working()).count()
    }

    fn working_pes(&self) -> impl Iterator<Item = &Pe> {
        self.pes.iter().filter(|pe| pe.is_working())
    }

    fn candidate_pes(&self, vm_id: u32, mips: u64) -> Vec<usize> {
        self.pes
            .iter()
            .enumerate()
            .filter(|(_, pe)| pe.is_working())
            .filter(|(_, pe)| {
                let provisioner = pe.provisioner();
                provisioner.available_mips() + provisioner.allocated_mips_for_vm(vm_id) >= mips
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn is_suitable_for_vm(&self, vm_id: u32, pes: u32, mips: u64) -> bool {
        self.candidate_pes(vm_id, mips).len() >= pes as usize
    }

    /// Allocates Pes for VM replacing its previous allocation, nothing changes on failure.
    pub fn allocate_pes_for_vm(&mut self, vm_id: u32, pes: u32, mips: u64) -> bool {
        let candidates = self.candidate_pes(vm_id, mips);
        if candidates.len() < pes as usize {
            return false;
        }
        self.deallocate_pes_for_vm(vm_id);
        for idx in candidates.into_iter().take(pes as usize) {
            self.pes[idx].provisioner_mut().allocate_mips_for_vm(vm_id, mips);
        }
        true
    }

    pub fn deallocate_pes_for_vm(&mut self, vm_id: u32) {
        for pe in self.pes.iter_mut() {
            pe.provisioner_mut().deallocate_mips_for_vm(vm_id);
        }
    }

    /// Returns MIPS granted to the VM on each of its Pes, failed Pes give nothing.
    pub fn allocated_mips_for_vm(&self, vm_id: u32) -> Vec<f64> {
        self.pes
            .iter()
            .filter(|pe| pe.provisioner().allocated_mips_for_vm(vm_id) > 0)
            .map(|pe| {
                if pe.is_working() {
                    pe.provisioner().allocated_mips_for_vm(vm_id) as f64
                } else {
                    0.
                }
            })
            .collect()
    }

    /// Marks Pe as failed, returns `false` if there is no such Pe.
    pub fn fail_pe(&mut self, pe_id: u32) -> bool {
        match self.pes.iter_mut().find(|pe| pe.id() == pe_id) {
            Some(pe) => {
                pe.set_status(PeStatus::Failed);
                true
            }
            None => false,
        }
    }

    pub fn all_pes_failed(&self) -> bool {
        self.pes.iter().all(|pe| !pe.is_working())
    }
}
