//! Selection of a VM to migrate out of an over-utilized host.

use dyn_clone::{clone_trait_object, DynClone};
use rand::prelude::*;
use rand_pcg::Pcg64;

use crate::core::config::error::ConfigError;
use crate::core::host::Host;
use crate::core::vm::VmRef;

/// Trait for implementation of VM selection strategies.
///
/// Returns `None` when no VM of the host can be migrated now, which means the host cannot be relieved in this pass.
pub trait VmSelectionStrategy: DynClone {
    fn select_vm(&mut self, host: &Host, time: f64) -> Option<VmRef>;
}

clone_trait_object!(VmSelectionStrategy);

fn migratable_vms(host: &Host) -> impl Iterator<Item = &VmRef> {
    host.vms()
        .iter()
        .filter(move |vm| !vm.borrow().is_in_migration() && !host.is_migrating_out(vm.borrow().id()))
}

/// Selects the VM with the lowest ratio of used MIPS to its Pe MIPS, the first one wins on ties.
#[derive(Clone, Default)]
pub struct MinimumUtilizationSelection;

impl MinimumUtilizationSelection {
    pub fn new() -> Self {
        Default::default()
    }
}

impl VmSelectionStrategy for MinimumUtilizationSelection {
    fn select_vm(&mut self, host: &Host, time: f64) -> Option<VmRef> {
        let mut result: Option<&VmRef> = None;
        let mut min_ratio = f64::MAX;
        for vm in migratable_vms(host) {
            let ratio = {
                let vm = vm.borrow();
                if vm.mips() == 0 {
                    0.
                } else {
                    vm.cpu_utilization_mips(time) / vm.mips() as f64
                }
            };
            if ratio < min_ratio {
                min_ratio = ratio;
                result = Some(vm);
            }
        }
        result.cloned()
    }
}

/// Selects a random VM.
#[derive(Clone)]
pub struct RandomSelection {
    rand: Pcg64,
}

impl RandomSelection {
    pub fn new(seed: u64) -> Self {
        Self {
            rand: Pcg64::seed_from_u64(seed),
        }
    }
}

impl VmSelectionStrategy for RandomSelection {
    fn select_vm(&mut self, host: &Host, _time: f64) -> Option<VmRef> {
        let candidates: Vec<&VmRef> = migratable_vms(host).collect();
        if candidates.is_empty() {
            return None;
        }
        let idx = self.rand.gen_range(0..candidates.len());
        Some(candidates[idx].clone())
    }
}

pub fn vm_selection_resolver(name: &str, seed: u64) -> Result<Box<dyn VmSelectionStrategy>, ConfigError> {
    match name {
        "MinimumUtilization" => Ok(Box::new(MinimumUtilizationSelection::new())),
        "Random" => Ok(Box::new(RandomSelection::new(seed))),
        _ => Err(ConfigError::UnknownVmSelection(name.to_string())),
    }
}
