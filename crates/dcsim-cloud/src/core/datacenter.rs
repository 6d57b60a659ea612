//! Datacenter: the component which hosts VMs and executes their cloudlets.

use std::collections::BTreeSet;
use std::rc::Rc;

use serde::Serialize;

use dcsim_core::log::fail_on_unexpected_event;
use dcsim_core::{log_debug, log_info, log_warn};
use dcsim_core::{Event, EventHandler, EventId, Id, SimulationContext, EPSILON};
use dcsim_storage::FileStorage;

use crate::core::allocation_policy::VmAllocationPolicy;
use crate::core::cloudlet::{Cloudlet, CloudletStatus};
use crate::core::common::{HostId, PlacementResult};
use crate::core::config::error::ConfigError;
use crate::core::config::DatacenterConfig;
use crate::core::datacenter_storage::DatacenterStorage;
use crate::core::energy_meter::EnergyMeter;
use crate::core::events::CloudEvent;
use crate::core::host::{find_host, find_host_mut, Host};
use crate::core::migration::migration_time;
use crate::core::vm::{VmRef, VmStatus};

// Grid points closer than this to the current time are considered reached.
const GRID_TOLERANCE: f64 = 1e-9;

/// Counters of datacenter activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatacenterStats {
    pub vms_created: u64,
    pub vms_rejected: u64,
    pub migrations: u64,
    pub failed_migrations: u64,
    pub hosts_failed: u64,
}

/// Datacenter owns the hosts and the VM allocation policy and processes requests of brokers.
///
/// Cloudlet execution is accounted lazily: every event first brings all hosts up to the current time, then
/// changes the state and schedules the next processing update.
pub struct Datacenter {
    hosts: Vec<Host>,
    policy: Box<dyn VmAllocationPolicy>,
    storage: DatacenterStorage,
    energy_meter: EnergyMeter,
    last_process_time: f64,
    last_migration_check: f64,
    pending_update: Option<(EventId, f64)>,
    hosts_to_deactivate: BTreeSet<HostId>,
    stats: DatacenterStats,
    ctx: SimulationContext<CloudEvent>,
    config: Rc<DatacenterConfig>,
}

impl Datacenter {
    pub fn new(
        ctx: SimulationContext<CloudEvent>,
        policy: Box<dyn VmAllocationPolicy>,
        config: Rc<DatacenterConfig>,
    ) -> Self {
        Self {
            hosts: Vec::new(),
            policy,
            storage: DatacenterStorage::new(),
            energy_meter: EnergyMeter::new(),
            last_process_time: 0.,
            last_migration_check: f64::NEG_INFINITY,
            pending_update: None,
            hosts_to_deactivate: BTreeSet::new(),
            stats: DatacenterStats::default(),
            ctx,
            config,
        }
    }

    pub fn id(&self) -> Id {
        self.ctx.id()
    }

    pub fn add_host(&mut self, host: Host) -> Result<HostId, ConfigError> {
        let id = host.id();
        if find_host(&self.hosts, id).is_some() {
            return Err(ConfigError::DuplicateHost(id));
        }
        log_debug!(self.ctx, "added host {} ({}) with {} MIPS", id, host.name(), host.total_mips());
        self.hosts.push(host);
        Ok(id)
    }

    /// Adds host built for the smallest id above all used ones and returns this id.
    pub fn add_host_with_free_id<F>(&mut self, build: F) -> HostId
    where
        F: FnOnce(HostId) -> Host,
    {
        let id = self.hosts.iter().map(|host| host.id() + 1).max().unwrap_or(0);
        let host = build(id);
        debug_assert_eq!(host.id(), id);
        log_debug!(self.ctx, "added host {} ({}) with {} MIPS", id, host.name(), host.total_mips());
        self.hosts.push(host);
        id
    }

    pub fn add_storage(&mut self, device: Box<dyn FileStorage>) {
        self.storage.add_storage(device);
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn host(&self, id: HostId) -> Option<&Host> {
        find_host(&self.hosts, id)
    }

    pub fn storage(&self) -> &DatacenterStorage {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut DatacenterStorage {
        &mut self.storage
    }

    pub fn policy(&self) -> &dyn VmAllocationPolicy {
        self.policy.as_ref()
    }

    pub fn stats(&self) -> &DatacenterStats {
        &self.stats
    }

    pub fn last_process_time(&self) -> f64 {
        self.last_process_time
    }

    /// Total energy consumed by hosts in Ws.
    pub fn total_energy(&self) -> f64 {
        self.energy_meter.energy_consumed()
    }

    pub fn host_energy(&self, host_id: HostId) -> f64 {
        self.energy_meter.host_energy_consumed(host_id)
    }

    /// Returns the placed VM with the given id.
    pub fn vm(&self, vm_id: u32) -> Option<VmRef> {
        let host_id = self.policy.host_of(vm_id)?;
        find_host(&self.hosts, host_id)?.vm(vm_id)
    }

    // PROCESSING //////////////////////////////////////////////////////////////////////////////////

    /// Brings all hosts up to the current time and returns the delay until the next cloudlet completion.
    ///
    /// Energy consumed since the previous update is accumulated using the utilization at both ends of the span,
    /// finished cloudlets are returned to their owners.
    fn update_processing(&mut self) -> Option<f64> {
        let time = self.ctx.time();
        let span = time - self.last_process_time;
        let mut next_delay: Option<f64> = None;
        let mut finished = Vec::new();
        for host in self.hosts.iter_mut() {
            if let Some(delay) = host.update_processing(time) {
                next_delay = Some(next_delay.map_or(delay, |d| d.min(delay)));
            }
            let utilization = host.cpu_utilization(time);
            if span > 0. {
                let energy = host.energy_linear_interpolation(host.previous_utilization(), utilization, span);
                self.energy_meter.add(host.id(), energy);
            }
            host.set_previous_utilization(utilization);
            for vm in host.vms() {
                finished.extend(vm.borrow_mut().scheduler_mut().take_finished());
            }
        }
        self.energy_meter.update(time);
        self.last_process_time = time;
        for cloudlet in finished {
            log_debug!(self.ctx, "cloudlet {} finished on VM {}", cloudlet.id, cloudlet.vm_id);
            self.return_cloudlet(cloudlet);
        }
        next_delay
    }

    /// Schedules the next processing update.
    ///
    /// With a positive scheduling interval the update happens at the next multiple of the interval or at the next
    /// cloudlet completion, whichever is earlier. Nothing is scheduled when no cloudlet is running.
    fn schedule_update(&mut self, next_finish: Option<f64>) {
        let time = self.ctx.time();
        let mut delay = match next_finish {
            Some(delay) if delay.is_finite() => delay,
            _ => return,
        };
        let interval = self.config.scheduling_interval;
        if interval > 0. {
            delay = delay.min(next_grid_time(time, interval) - time);
        }
        let delay = delay.max(self.config.min_time_between_events + EPSILON);
        let at = time + delay;
        if let Some((event_id, pending_at)) = self.pending_update {
            if pending_at <= at {
                return;
            }
            self.ctx.cancel_event(event_id);
        }
        let event_id = self.ctx.emit_self(CloudEvent::UpdateProcessing, delay);
        self.pending_update = Some((event_id, at));
    }

    fn reschedule(&mut self) {
        let next_finish = self.update_processing();
        self.schedule_update(next_finish);
    }

    fn return_cloudlet(&self, cloudlet: Cloudlet) {
        let owner = cloudlet.owner;
        self.ctx.emit_now(CloudEvent::CloudletReturn { cloudlet }, owner);
    }

    fn on_update_processing(&mut self) {
        self.pending_update = None;
        let time = self.ctx.time();
        let next_finish = self.update_processing();
        if self.config.migrations_enabled && time - self.last_migration_check > self.config.migration_retry_delay {
            self.last_migration_check = time;
            let map = self.policy.optimize_allocation(&self.hosts, time);
            if !map.is_empty() {
                log_info!(
                    self.ctx,
                    "optimization planned {} migrations from hosts {:?}",
                    map.len(),
                    map.sources()
                );
            }
            self.hosts_to_deactivate.extend(map.hosts_to_deactivate.iter().copied());
            for entry in map.entries {
                self.start_migration(entry.vm, entry.target, None);
            }
        }
        self.schedule_update(next_finish);
    }

    // VM LIFECYCLE ////////////////////////////////////////////////////////////////////////////////

    fn on_vm_create(&mut self, vms: Vec<VmRef>, ack: bool, requester: Id) {
        let time = self.ctx.time();
        for vm in vms {
            let (vm_id, status) = {
                let vm = vm.borrow();
                (vm.id(), vm.status())
            };
            let result = if matches!(status, VmStatus::Requested | VmStatus::Rejected) {
                self.policy.allocate_host_for_vm(&vm, &mut self.hosts, time)
            } else {
                log_warn!(self.ctx, "VM {} can't be created in status {}", vm_id, status);
                PlacementResult::NoSuitableHost
            };
            match result {
                PlacementResult::Placed(host_id) => {
                    self.stats.vms_created += 1;
                    self.hosts_to_deactivate.remove(&host_id);
                    let share = find_host(&self.hosts, host_id)
                        .map(|host| host.allocated_mips_for_vm(vm_id))
                        .unwrap_or_default();
                    vm.borrow_mut().update_processing(time, &share);
                    log_info!(self.ctx, "VM {} created on host {}", vm_id, host_id);
                }
                PlacementResult::NoSuitableHost => {
                    if status == VmStatus::Requested {
                        vm.borrow_mut().set_status(VmStatus::Rejected);
                    }
                    self.stats.vms_rejected += 1;
                    log_warn!(self.ctx, "no suitable host for VM {}", vm_id);
                }
            }
            if ack {
                self.ctx.emit_now(CloudEvent::VmCreateAck { vm_id, result }, requester);
            }
        }
    }

    fn on_vm_destroy(&mut self, vm_id: u32, ack: bool, requester: Id) {
        let success = match self.vm(vm_id) {
            Some(vm) => {
                self.update_processing();
                if vm.borrow().scheduler().has_unfinished() {
                    log_warn!(self.ctx, "VM {} is destroyed with unfinished cloudlets", vm_id);
                }
                if vm.borrow().is_in_migration() {
                    for host in self.hosts.iter_mut() {
                        host.remove_migrating_in_vm(vm_id);
                    }
                }
                self.policy.deallocate_host_for_vm(&vm, &mut self.hosts);
                let mut vm = vm.borrow_mut();
                vm.set_in_migration(false);
                vm.set_status(VmStatus::Destroyed);
                log_info!(self.ctx, "VM {} destroyed", vm_id);
                true
            }
            None => {
                log_warn!(self.ctx, "can't destroy unknown VM {}", vm_id);
                false
            }
        };
        if ack {
            self.ctx.emit_now(CloudEvent::VmDestroyAck { vm_id, success }, requester);
        }
        self.reschedule();
    }

    /// Reserves resources on the target host and schedules the end of the VM memory transfer.
    fn start_migration(&mut self, vm: VmRef, target: HostId, requester: Option<Id>) -> bool {
        if !self.ctx.has_pending_event(|e| e.data.is_migration_in_progress()) {
            self.update_processing();
        }
        let (vm_id, ram, source) = {
            let vm = vm.borrow();
            (vm.id(), vm.ram(), vm.host())
        };
        let source = match source {
            Some(source) if source != target && !vm.borrow().is_in_migration() => source,
            _ => {
                log_warn!(self.ctx, "VM {} can't be migrated to host {}", vm_id, target);
                return false;
            }
        };
        let target_host = match find_host_mut(&mut self.hosts, target) {
            Some(host) => host,
            None => {
                log_warn!(self.ctx, "can't migrate VM {} to unknown host {}", vm_id, target);
                return false;
            }
        };
        // zero bandwidth of the target gives no finite transfer time
        let delay = migration_time(ram, target_host.bw().capacity(), self.config.bandwidth_percent_for_migration);
        if !delay.is_finite() || !target_host.add_migrating_in_vm(&vm) {
            log_warn!(self.ctx, "host {} can't accept VM {}", target, vm_id);
            return false;
        }
        if let Some(host) = find_host_mut(&mut self.hosts, source) {
            host.mark_migrating_out(vm_id);
        }
        {
            let mut vm = vm.borrow_mut();
            vm.set_in_migration(true);
            vm.set_status(VmStatus::Migrating);
        }
        log_info!(
            self.ctx,
            "migration of VM {} from host {} to host {} started, expected to take {:.3}",
            vm_id,
            source,
            target,
            delay
        );
        self.ctx.emit_self(CloudEvent::VmMigrationComplete { vm, target, requester }, delay);
        true
    }

    fn on_vm_migrate(&mut self, vm: VmRef, target: HostId, ack: bool, requester: Id) {
        let vm_id = vm.borrow().id();
        let started = self.start_migration(vm, target, if ack { Some(requester) } else { None });
        if !started && ack {
            self.ctx.emit_now(
                CloudEvent::VmMigrateAck {
                    vm_id,
                    target,
                    success: false,
                },
                requester,
            );
        }
    }

    fn on_migration_complete(&mut self, vm: VmRef, target: HostId, requester: Option<Id>) {
        self.update_processing();
        let (vm_id, status, source) = {
            let vm = vm.borrow();
            (vm.id(), vm.status(), vm.host())
        };
        if let Some(host) = find_host_mut(&mut self.hosts, target) {
            host.remove_migrating_in_vm(vm_id);
        }
        let success = if status == VmStatus::Migrating {
            self.policy.deallocate_host_for_vm(&vm, &mut self.hosts);
            vm.borrow_mut().set_in_migration(false);
            if self.policy.allocate_host_for_vm_on(&vm, target, &mut self.hosts) {
                self.stats.migrations += 1;
                log_info!(self.ctx, "VM {} migrated to host {}", vm_id, target);
                true
            } else {
                self.stats.failed_migrations += 1;
                log_warn!(self.ctx, "migration of VM {} to host {} failed", vm_id, target);
                let restored = source.map_or(false, |source| {
                    self.policy.allocate_host_for_vm_on(&vm, source, &mut self.hosts)
                });
                if !restored {
                    log_warn!(self.ctx, "VM {} lost its host", vm_id);
                    self.fail_vm(&vm);
                }
                false
            }
        } else {
            log_debug!(self.ctx, "migration of VM {} abandoned in status {}", vm_id, status);
            false
        };
        if let Some(source) = source {
            self.try_deactivate(source);
        }
        if let Some(requester) = requester {
            self.ctx.emit_now(
                CloudEvent::VmMigrateAck {
                    vm_id,
                    target,
                    success,
                },
                requester,
            );
        }
        self.reschedule();
    }

    fn try_deactivate(&mut self, host_id: HostId) {
        if !self.hosts_to_deactivate.contains(&host_id) {
            return;
        }
        if let Some(host) = find_host_mut(&mut self.hosts, host_id) {
            if host.vms().is_empty() && host.vms_migrating_in().is_empty() {
                host.set_active(false);
                self.hosts_to_deactivate.remove(&host_id);
                log_info!(self.ctx, "host {} is switched off", host_id);
            }
        }
    }

    fn fail_vm(&mut self, vm: &VmRef) {
        let time = self.ctx.time();
        self.policy.deallocate_host_for_vm(vm, &mut self.hosts);
        let cloudlets = {
            let mut vm = vm.borrow_mut();
            vm.set_in_migration(false);
            vm.set_status(VmStatus::Failed);
            vm.scheduler_mut().fail_all(time)
        };
        for cloudlet in cloudlets {
            self.return_cloudlet(cloudlet);
        }
    }

    fn on_pe_failure(&mut self, host_id: HostId, pe_id: u32) {
        self.update_processing();
        let host = match find_host_mut(&mut self.hosts, host_id) {
            Some(host) => host,
            None => {
                log_warn!(self.ctx, "can't fail Pe {} of unknown host {}", pe_id, host_id);
                return;
            }
        };
        let host_failed = host.fail_pe(pe_id);
        log_warn!(self.ctx, "Pe {} of host {} failed", pe_id, host_id);
        if host_failed {
            let vms = host.vms().to_vec();
            let migrating_in: Vec<u32> = host.vms_migrating_in().iter().map(|vm| vm.borrow().id()).collect();
            for vm_id in migrating_in {
                host.remove_migrating_in_vm(vm_id);
            }
            self.stats.hosts_failed += 1;
            for vm in &vms {
                self.fail_vm(vm);
            }
            log_warn!(self.ctx, "host {} failed, {} VMs lost", host_id, vms.len());
        }
        self.reschedule();
    }

    // CLOUDLETS ///////////////////////////////////////////////////////////////////////////////////

    fn on_cloudlet_submit(&mut self, cloudlets: Vec<Cloudlet>, ack: bool, requester: Id) {
        self.update_processing();
        let time = self.ctx.time();
        for mut cloudlet in cloudlets {
            let (cloudlet_id, vm_id) = (cloudlet.id, cloudlet.vm_id);
            let success = if cloudlet.is_finished() {
                log_warn!(self.ctx, "cloudlet {} is already finished", cloudlet_id);
                self.return_cloudlet(cloudlet);
                false
            } else if let Some(vm) = self.vm(vm_id) {
                let file_transfer_time = self.storage.predict_file_transfer_time(&cloudlet.required_files);
                let estimate = vm
                    .borrow_mut()
                    .scheduler_mut()
                    .submit(cloudlet, file_transfer_time, time);
                log_debug!(
                    self.ctx,
                    "cloudlet {} submitted to VM {}, expected to finish in {:.3}",
                    cloudlet_id,
                    vm_id,
                    estimate
                );
                true
            } else {
                log_warn!(self.ctx, "cloudlet {} is submitted to unknown VM {}", cloudlet_id, vm_id);
                cloudlet.set_status(CloudletStatus::Failed, time);
                self.return_cloudlet(cloudlet);
                false
            };
            if ack {
                self.ctx.emit_now(
                    CloudEvent::CloudletSubmitAck {
                        cloudlet_id,
                        vm_id,
                        success,
                    },
                    requester,
                );
            }
        }
        self.reschedule();
    }

    fn on_cloudlet_cancel(&mut self, cloudlet_id: u32, vm_id: u32, ack: bool, requester: Id) {
        self.update_processing();
        let time = self.ctx.time();
        let canceled = self
            .vm(vm_id)
            .and_then(|vm| vm.borrow_mut().scheduler_mut().cancel(cloudlet_id, time));
        let success = canceled.is_some();
        if let Some(cloudlet) = canceled {
            self.return_cloudlet(cloudlet);
        }
        if ack {
            self.ctx.emit_now(
                CloudEvent::CloudletCancelAck {
                    cloudlet_id,
                    vm_id,
                    success,
                },
                requester,
            );
        }
        self.reschedule();
    }

    fn on_cloudlet_pause(&mut self, cloudlet_id: u32, vm_id: u32, ack: bool, requester: Id) {
        self.update_processing();
        let time = self.ctx.time();
        let success = self
            .vm(vm_id)
            .map_or(false, |vm| vm.borrow_mut().scheduler_mut().pause(cloudlet_id, time));
        if ack {
            self.ctx.emit_now(
                CloudEvent::CloudletPauseAck {
                    cloudlet_id,
                    vm_id,
                    success,
                },
                requester,
            );
        }
        self.reschedule();
    }

    fn on_cloudlet_resume(&mut self, cloudlet_id: u32, vm_id: u32, ack: bool, requester: Id) {
        self.update_processing();
        let time = self.ctx.time();
        let success = self
            .vm(vm_id)
            .and_then(|vm| vm.borrow_mut().scheduler_mut().resume(cloudlet_id, time))
            .is_some();
        if ack {
            self.ctx.emit_now(
                CloudEvent::CloudletResumeAck {
                    cloudlet_id,
                    vm_id,
                    success,
                },
                requester,
            );
        }
        self.reschedule();
    }
}

/// Returns the first multiple of `interval` after `time`.
pub fn next_grid_time(time: f64, interval: f64) -> f64 {
    let ticks = (time / interval).round();
    if ticks * interval > time + GRID_TOLERANCE {
        ticks * interval
    } else {
        (ticks + 1.) * interval
    }
}

impl EventHandler<CloudEvent> for Datacenter {
    fn on(&mut self, event: Event<CloudEvent>) {
        let Event { id, time, src, dst, data } = event;
        match data {
            CloudEvent::VmCreate { vms, ack } => self.on_vm_create(vms, ack, src),
            CloudEvent::VmDestroy { vm_id, ack } => self.on_vm_destroy(vm_id, ack, src),
            CloudEvent::VmMigrate { vm, target, ack } => self.on_vm_migrate(vm, target, ack, src),
            CloudEvent::VmMigrationComplete { vm, target, requester } => {
                self.on_migration_complete(vm, target, requester)
            }
            CloudEvent::CloudletSubmit { cloudlets, ack } => self.on_cloudlet_submit(cloudlets, ack, src),
            CloudEvent::CloudletCancel { cloudlet_id, vm_id, ack } => {
                self.on_cloudlet_cancel(cloudlet_id, vm_id, ack, src)
            }
            CloudEvent::CloudletPause { cloudlet_id, vm_id, ack } => {
                self.on_cloudlet_pause(cloudlet_id, vm_id, ack, src)
            }
            CloudEvent::CloudletResume { cloudlet_id, vm_id, ack } => {
                self.on_cloudlet_resume(cloudlet_id, vm_id, ack, src)
            }
            CloudEvent::UpdateProcessing => self.on_update_processing(),
            CloudEvent::PeFailure { host_id, pe_id } => self.on_pe_failure(host_id, pe_id),
            other => fail_on_unexpected_event(
                Event {
                    id,
                    time,
                    src,
                    dst,
                    data: other,
                },
                "datacenter",
            ),
        }
    }
}
