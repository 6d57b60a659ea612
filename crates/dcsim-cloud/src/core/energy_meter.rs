//! Energy meter accumulates the energy consumption of datacenter hosts.

use indexmap::IndexMap;

use crate::core::common::HostId;

/// Energy meter structure.
#[derive(Debug, Clone, Default)]
pub struct EnergyMeter {
    host_energy: IndexMap<HostId, f64>,
    total_energy: f64,
    prev_time: f64,
}

impl EnergyMeter {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds energy (in Ws) consumed by the host since the previous update.
    pub fn add(&mut self, host_id: HostId, energy: f64) {
        *self.host_energy.entry(host_id).or_insert(0.) += energy;
        self.total_energy += energy;
    }

    /// Invoked after all hosts are accounted at the given time.
    pub fn update(&mut self, time: f64) {
        self.prev_time = time;
    }

    /// Time of the last update.
    pub fn prev_time(&self) -> f64 {
        self.prev_time
    }

    /// Returns the total energy consumption.
    pub fn energy_consumed(&self) -> f64 {
        self.total_energy
    }

    pub fn host_energy_consumed(&self, host_id: HostId) -> f64 {
        self.host_energy.get(&host_id).copied().unwrap_or(0.)
    }
}
