//! Broker submits requests of a cloud user to a datacenter and records the replies.

use serde_json::json;

use dcsim_core::log::fail_on_unexpected_event;
use dcsim_core::{log_debug, log_info};
use dcsim_core::{Event, EventHandler, Id, SimulationContext};

use crate::core::cloudlet::Cloudlet;
use crate::core::common::{HostId, PlacementResult};
use crate::core::events::CloudEvent;
use crate::core::vm::VmRef;

/// Request producer acting on behalf of a cloud user.
///
/// Broker does not make any scheduling decisions, it only sends what it is told to and keeps
/// the acknowledgements and returned cloudlets for inspection.
pub struct Broker {
    datacenter_id: Id,
    acks: Vec<(f64, CloudEvent)>,
    returned: Vec<Cloudlet>,
    ctx: SimulationContext<CloudEvent>,
}

impl Broker {
    pub fn new(ctx: SimulationContext<CloudEvent>, datacenter_id: Id) -> Self {
        Self {
            datacenter_id,
            acks: Vec::new(),
            returned: Vec::new(),
            ctx,
        }
    }

    pub fn id(&self) -> Id {
        self.ctx.id()
    }

    pub fn submit_vms(&self, vms: Vec<VmRef>, ack: bool, delay: f64) {
        log_debug!(self.ctx, "submitting {} VMs", vms.len());
        self.ctx.emit(CloudEvent::VmCreate { vms, ack }, self.datacenter_id, delay);
    }

    pub fn destroy_vm(&self, vm_id: u32, ack: bool, delay: f64) {
        self.ctx.emit(CloudEvent::VmDestroy { vm_id, ack }, self.datacenter_id, delay);
    }

    pub fn migrate_vm(&self, vm: VmRef, target: HostId, ack: bool, delay: f64) {
        self.ctx.emit(CloudEvent::VmMigrate { vm, target, ack }, self.datacenter_id, delay);
    }

    pub fn submit_cloudlets(&self, cloudlets: Vec<Cloudlet>, ack: bool, delay: f64) {
        log_debug!(self.ctx, "submitting {} cloudlets", cloudlets.len());
        self.ctx.emit(CloudEvent::CloudletSubmit { cloudlets, ack }, self.datacenter_id, delay);
    }

    pub fn cancel_cloudlet(&self, cloudlet_id: u32, vm_id: u32, ack: bool, delay: f64) {
        let request = CloudEvent::CloudletCancel { cloudlet_id, vm_id, ack };
        self.ctx.emit(request, self.datacenter_id, delay);
    }

    pub fn pause_cloudlet(&self, cloudlet_id: u32, vm_id: u32, ack: bool, delay: f64) {
        let request = CloudEvent::CloudletPause { cloudlet_id, vm_id, ack };
        self.ctx.emit(request, self.datacenter_id, delay);
    }

    pub fn resume_cloudlet(&self, cloudlet_id: u32, vm_id: u32, ack: bool, delay: f64) {
        let request = CloudEvent::CloudletResume { cloudlet_id, vm_id, ack };
        self.ctx.emit(request, self.datacenter_id, delay);
    }

    /// Acknowledgements in the order of arrival with their times.
    pub fn acks(&self) -> &[(f64, CloudEvent)] {
        &self.acks
    }

    /// Cloudlets returned by the datacenter, finished or not.
    pub fn returned_cloudlets(&self) -> &[Cloudlet] {
        &self.returned
    }

    pub fn returned_cloudlet(&self, cloudlet_id: u32) -> Option<&Cloudlet> {
        self.returned.iter().find(|c| c.id == cloudlet_id)
    }

    /// Ids of VMs acknowledged as created.
    pub fn created_vms(&self) -> Vec<u32> {
        self.vm_create_results()
            .filter(|(_, result)| result.is_placed())
            .map(|(vm_id, _)| vm_id)
            .collect()
    }

    /// Ids of VMs acknowledged as rejected.
    pub fn rejected_vms(&self) -> Vec<u32> {
        self.vm_create_results()
            .filter(|(_, result)| !result.is_placed())
            .map(|(vm_id, _)| vm_id)
            .collect()
    }

    fn vm_create_results(&self) -> impl Iterator<Item = (u32, PlacementResult)> + '_ {
        self.acks.iter().filter_map(|(_, ack)| match ack {
            CloudEvent::VmCreateAck { vm_id, result } => Some((*vm_id, *result)),
            _ => None,
        })
    }
}

impl EventHandler<CloudEvent> for Broker {
    fn on(&mut self, event: Event<CloudEvent>) {
        match event.data {
            CloudEvent::CloudletReturn { cloudlet } => {
                log_info!(
                    self.ctx,
                    "cloudlet {} returned with status {:?}",
                    cloudlet.id,
                    cloudlet.status()
                );
                self.returned.push(cloudlet);
            }
            CloudEvent::VmCreateAck { .. }
            | CloudEvent::VmDestroyAck { .. }
            | CloudEvent::VmMigrateAck { .. }
            | CloudEvent::CloudletSubmitAck { .. }
            | CloudEvent::CloudletCancelAck { .. }
            | CloudEvent::CloudletPauseAck { .. }
            | CloudEvent::CloudletResumeAck { .. } => {
                log_debug!(self.ctx, "received {}", json!(&event.data));
                self.acks.push((event.time, event.data));
            }
            _ => fail_on_unexpected_event(event, "broker"),
        }
    }
}
