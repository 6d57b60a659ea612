//! VM migration: host utilization thresholds, selection of VMs to migrate and migration planning.

pub mod policy;
pub mod threshold;
pub mod vm_selection;

use std::collections::BTreeSet;

use crate::core::common::HostId;
use crate::core::vm::VmRef;

/// Planned relocation of a VM.
#[derive(Clone)]
pub struct MigrationEntry {
    pub vm: VmRef,
    pub source: HostId,
    pub target: HostId,
}

/// Result of one optimization pass of an allocation policy.
#[derive(Clone, Default)]
pub struct MigrationMap {
    pub entries: Vec<MigrationEntry>,
    /// Hosts which become empty when all planned migrations complete.
    pub hosts_to_deactivate: Vec<HostId>,
}

impl MigrationMap {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn sources(&self) -> BTreeSet<HostId> {
        self.entries.iter().map(|e| e.source).collect()
    }

    pub fn target_of(&self, vm_id: u32) -> Option<HostId> {
        self.entries
            .iter()
            .find(|e| e.vm.borrow().id() == vm_id)
            .map(|e| e.target)
    }
}

/// Returns time in seconds to transfer VM memory of `ram` MB over a link of `bw` bit/s,
/// of which `bandwidth_percent` is used for migration.
pub fn migration_time(ram: u64, bw: u64, bandwidth_percent: f64) -> f64 {
    let bandwidth_mb_per_sec = bw as f64 * bandwidth_percent / 8. / 1e6;
    ram as f64 / bandwidth_mb_per_sec
}
