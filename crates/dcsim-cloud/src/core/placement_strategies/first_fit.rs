//! First Fit strategy.

use crate::core::host::Host;
use crate::core::placement_strategy::PlacementStrategy;

/// Tries hosts in the order they were added to the datacenter.
#[derive(Clone, Default)]
pub struct FirstFit;

impl FirstFit {
    pub fn new() -> Self {
        Default::default()
    }
}

impl PlacementStrategy for FirstFit {
    fn order_hosts(&self, hosts: &[Host], _time: f64) -> Vec<usize> {
        (0..hosts.len()).collect()
    }
}
