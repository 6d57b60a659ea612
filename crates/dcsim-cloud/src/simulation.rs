//! Facade which builds a datacenter and drives the simulation.

use std::cell::RefCell;
use std::rc::Rc;

use sugars::{rc, refcell};

use dcsim_core::{Id, Simulation, SimulationContext};
use dcsim_models::power::PowerModel;
use dcsim_storage::{FileStorage, HarddriveStorage, SanStorage};

use crate::core::allocation_policy::{vm_allocation_policy_resolver, VmAllocationPolicy};
use crate::core::broker::Broker;
use crate::core::common::HostId;
use crate::core::config::error::ConfigError;
use crate::core::config::{DatacenterConfig, StorageConfig, StorageType};
use crate::core::datacenter::Datacenter;
use crate::core::events::CloudEvent;
use crate::core::host::Host;
use crate::core::pe::make_pes;
use crate::core::power_model::power_model_resolver;

pub struct CloudSimulation {
    datacenter: Rc<RefCell<Datacenter>>,
    datacenter_id: Id,
    sim: Simulation<CloudEvent>,
    ctx: SimulationContext<CloudEvent>,
    config: Rc<DatacenterConfig>,
}

impl CloudSimulation {
    /// Creates simulation with a datacenter described by the config.
    ///
    /// The allocation policy is resolved from `config.vm_allocation_policy`, random strategies inherit `seed`.
    pub fn new(seed: u64, config: DatacenterConfig) -> Result<Self, ConfigError> {
        let policy = vm_allocation_policy_resolver(&config.vm_allocation_policy, seed)?;
        Self::with_policy(seed, config, policy)
    }

    /// Creates simulation with a datacenter using the given allocation policy.
    pub fn with_policy(
        seed: u64,
        config: DatacenterConfig,
        policy: Box<dyn VmAllocationPolicy>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let config = rc!(config);
        let mut sim = Simulation::new(seed);
        let datacenter = rc!(refcell!(Datacenter::new(
            sim.create_context("datacenter"),
            policy,
            config.clone()
        )));
        let datacenter_id = sim.add_handler("datacenter", datacenter.clone());
        let ctx = sim.create_context("simulation");
        let mut simulation = Self {
            datacenter,
            datacenter_id,
            sim,
            ctx,
            config: config.clone(),
        };

        for host_config in config.hosts.iter() {
            for name in host_config.names() {
                let power_model = match &host_config.power_model {
                    Some(model) => Some(power_model_resolver(model)?),
                    None => None,
                };
                simulation.add_host_with_power_model(
                    &name,
                    host_config.pes,
                    host_config.mips,
                    host_config.ram,
                    host_config.bw,
                    host_config.storage,
                    power_model,
                );
            }
        }
        for storage_config in config.storages.iter() {
            let device = build_storage(storage_config)?;
            simulation.add_storage(device);
        }
        Ok(simulation)
    }

    /// Adds host with identical Pes and returns its id.
    pub fn add_host(&mut self, name: &str, pes: u32, mips: u64, ram: u64, bw: u64, storage: u64) -> HostId {
        self.add_host_with_power_model(name, pes, mips, ram, bw, storage, None)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_host_with_power_model(
        &mut self,
        name: &str,
        pes: u32,
        mips: u64,
        ram: u64,
        bw: u64,
        storage: u64,
        power_model: Option<Box<dyn PowerModel>>,
    ) -> HostId {
        self.datacenter.borrow_mut().add_host_with_free_id(|id| {
            let host = Host::new(id, name, make_pes(pes, mips), ram, bw, storage);
            match power_model {
                Some(power_model) => host.with_power_model(power_model),
                None => host,
            }
        })
    }

    pub fn add_storage(&mut self, device: Box<dyn FileStorage>) {
        self.datacenter.borrow_mut().add_storage(device);
    }

    /// Creates broker sending requests to the datacenter.
    pub fn create_broker(&mut self, name: &str) -> Rc<RefCell<Broker>> {
        let broker = rc!(refcell!(Broker::new(self.sim.create_context(name), self.datacenter_id)));
        self.sim.add_handler(name, broker.clone());
        broker
    }

    pub fn datacenter(&self) -> Rc<RefCell<Datacenter>> {
        self.datacenter.clone()
    }

    pub fn datacenter_id(&self) -> Id {
        self.datacenter_id
    }

    pub fn config(&self) -> Rc<DatacenterConfig> {
        self.config.clone()
    }

    /// Fails the Pe of the host after the delay.
    pub fn inject_pe_failure(&self, host_id: HostId, pe_id: u32, delay: f64) {
        self.ctx.emit(CloudEvent::PeFailure { host_id, pe_id }, self.datacenter_id, delay);
    }

    pub fn context(&self) -> &SimulationContext<CloudEvent> {
        &self.ctx
    }

    pub fn step(&mut self) -> bool {
        self.sim.step()
    }

    pub fn steps(&mut self, step_count: u64) -> bool {
        self.sim.steps(step_count)
    }

    pub fn step_until_no_events(&mut self) {
        self.sim.step_until_no_events();
    }

    pub fn step_for_duration(&mut self, duration: f64) -> bool {
        self.sim.step_for_duration(duration)
    }

    pub fn step_until_time(&mut self, time: f64) -> bool {
        self.sim.step_until_time(time)
    }

    pub fn event_count(&self) -> u64 {
        self.sim.event_count()
    }

    pub fn current_time(&self) -> f64 {
        self.sim.time()
    }
}

fn build_storage(config: &StorageConfig) -> Result<Box<dyn FileStorage>, ConfigError> {
    let invalid = |what: &str| ConfigError::InvalidStorage(format!("{} of storage {}", what, config.name));
    let mut disk = HarddriveStorage::new(&config.name, config.capacity);
    if let Some(rate) = config.max_transfer_rate {
        if !disk.set_max_transfer_rate(rate) {
            return Err(invalid("max_transfer_rate"));
        }
    }
    match config.r#type {
        StorageType::Harddrive => Ok(Box::new(disk)),
        StorageType::San => {
            let bandwidth = config.bandwidth.ok_or_else(|| invalid("missing bandwidth"))?;
            let latency = config.network_latency.unwrap_or(0.);
            let mut san = SanStorage::new(&config.name, config.capacity, bandwidth, latency)
                .ok_or_else(|| invalid("bandwidth or network_latency"))?;
            if let Some(rate) = config.max_transfer_rate {
                san.disk_mut().set_max_transfer_rate(rate);
            }
            Ok(Box::new(san))
        }
    }
}
