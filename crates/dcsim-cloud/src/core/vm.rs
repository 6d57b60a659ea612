//! Representation of virtual machine and its status.

use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use dcsim_core::Id;

use crate::core::cloudlet_scheduler::{CloudletScheduler, TimeSharedCloudletScheduler};
use crate::core::common::HostId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VmStatus {
    Requested,
    Allocated,
    Migrating,
    Rejected,
    Destroyed,
    Failed,
}

impl Display for VmStatus {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            VmStatus::Requested => write!(f, "requested"),
            VmStatus::Allocated => write!(f, "allocated"),
            VmStatus::Migrating => write!(f, "migrating"),
            VmStatus::Rejected => write!(f, "rejected"),
            VmStatus::Destroyed => write!(f, "destroyed"),
            VmStatus::Failed => write!(f, "failed"),
        }
    }
}

/// VM shared between the broker which requested it and the host running it.
pub type VmRef = Rc<RefCell<Vm>>;

/// Represents virtual machine (VM).
///
// VM is characterized by its resource requirements: number of Pes and MIPS of each of them, RAM, bandwidth and
// image size. The actual CPU usage is defined by cloudlets running inside the VM.
pub struct Vm {
    id: u32,
    owner: Id,
    pes: u32,
    mips: u64,
    ram: u64,
    bw: u64,
    size: u64,
    status: VmStatus,
    host: Option<HostId>,
    in_migration: bool,
    scheduler: Box<dyn CloudletScheduler>,
}

impl Serialize for Vm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Vm", 6)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("pes", &self.pes)?;
        state.serialize_field("mips", &self.mips)?;
        state.serialize_field("ram", &self.ram)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("host", &self.host)?;
        state.end()
    }
}

impl Vm {
    /// Creates VM with time-shared cloudlet scheduler.
    pub fn new(id: u32, owner: Id, pes: u32, mips: u64, ram: u64, bw: u64, size: u64) -> Self {
        Self {
            id,
            owner,
            pes,
            mips,
            ram,
            bw,
            size,
            status: VmStatus::Requested,
            host: None,
            in_migration: false,
            scheduler: Box::new(TimeSharedCloudletScheduler::new()),
        }
    }

    pub fn with_scheduler(mut self, scheduler: Box<dyn CloudletScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn into_ref(self) -> VmRef {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn owner(&self) -> Id {
        self.owner
    }

    pub fn pes(&self) -> u32 {
        self.pes
    }

    /// MIPS of each Pe.
    pub fn mips(&self) -> u64 {
        self.mips
    }

    pub fn total_mips(&self) -> u64 {
        self.mips * self.pes as u64
    }

    pub fn ram(&self) -> u64 {
        self.ram
    }

    pub fn bw(&self) -> u64 {
        self.bw
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn status(&self) -> VmStatus {
        self.status
    }

    pub fn set_status(&mut self, status: VmStatus) {
        self.status = status;
    }

    pub fn host(&self) -> Option<HostId> {
        self.host
    }

    pub fn set_host(&mut self, host: Option<HostId>) {
        self.host = host;
    }

    pub fn is_in_migration(&self) -> bool {
        self.in_migration
    }

    pub fn set_in_migration(&mut self, in_migration: bool) {
        self.in_migration = in_migration;
    }

    pub fn scheduler(&self) -> &dyn CloudletScheduler {
        self.scheduler.as_ref()
    }

    pub fn scheduler_mut(&mut self) -> &mut dyn CloudletScheduler {
        self.scheduler.as_mut()
    }

    /// Updates cloudlets processing, returns the delay until the next cloudlet completion.
    pub fn update_processing(&mut self, time: f64, mips_share: &[f64]) -> Option<f64> {
        self.scheduler.update_processing(time, mips_share)
    }

    /// MIPS currently requested by the running cloudlets.
    pub fn cpu_utilization_mips(&self, time: f64) -> f64 {
        self.scheduler.requested_utilization(time) * self.total_mips() as f64
    }
}
