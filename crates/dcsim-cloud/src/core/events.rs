//! Simulation events.

use serde::Serialize;

use dcsim_core::Id;

use crate::core::cloudlet::Cloudlet;
use crate::core::common::{HostId, PlacementResult};
use crate::core::vm::VmRef;

/// Payload of all events exchanged by the cloud components.
///
/// Requests carry an `ack` flag, the datacenter replies to the request source with the matching `*Ack` event
/// only when it is set.
#[derive(Clone, Serialize)]
pub enum CloudEvent {
    // VM LIFECYCLE ////////////////////////////////////////////////////////////////////////////////
    VmCreate {
        vms: Vec<VmRef>,
        ack: bool,
    },
    VmCreateAck {
        vm_id: u32,
        result: PlacementResult,
    },
    VmDestroy {
        vm_id: u32,
        ack: bool,
    },
    VmDestroyAck {
        vm_id: u32,
        success: bool,
    },
    /// Requests live migration of the VM to the target host.
    VmMigrate {
        vm: VmRef,
        target: HostId,
        ack: bool,
    },
    /// Completes migration of the VM, emitted by the datacenter to itself when the memory transfer is over.
    VmMigrationComplete {
        vm: VmRef,
        target: HostId,
        requester: Option<Id>,
    },
    VmMigrateAck {
        vm_id: u32,
        target: HostId,
        success: bool,
    },

    // CLOUDLETS ///////////////////////////////////////////////////////////////////////////////////
    CloudletSubmit {
        cloudlets: Vec<Cloudlet>,
        ack: bool,
    },
    CloudletSubmitAck {
        cloudlet_id: u32,
        vm_id: u32,
        success: bool,
    },
    CloudletCancel {
        cloudlet_id: u32,
        vm_id: u32,
        ack: bool,
    },
    CloudletCancelAck {
        cloudlet_id: u32,
        vm_id: u32,
        success: bool,
    },
    CloudletPause {
        cloudlet_id: u32,
        vm_id: u32,
        ack: bool,
    },
    CloudletPauseAck {
        cloudlet_id: u32,
        vm_id: u32,
        success: bool,
    },
    CloudletResume {
        cloudlet_id: u32,
        vm_id: u32,
        ack: bool,
    },
    CloudletResumeAck {
        cloudlet_id: u32,
        vm_id: u32,
        success: bool,
    },
    /// Finished (or failed) cloudlet sent back to its owner.
    CloudletReturn {
        cloudlet: Cloudlet,
    },

    // DATACENTER INTERNALS ////////////////////////////////////////////////////////////////////////
    UpdateProcessing,
    PeFailure {
        host_id: HostId,
        pe_id: u32,
    },
}

impl CloudEvent {
    pub fn is_migration_in_progress(&self) -> bool {
        matches!(self, CloudEvent::VmMigrationComplete { .. })
    }
}
