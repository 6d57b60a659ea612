//! Best Fit strategy.

use crate::core::host::Host;
use crate::core::placement_strategy::{sort_by_utilization, PlacementStrategy};

/// Uses the most loaded (by CPU utilization) suitable host.
#[derive(Clone, Default)]
pub struct BestFit;

impl BestFit {
    pub fn new() -> Self {
        Default::default()
    }
}

impl PlacementStrategy for BestFit {
    fn order_hosts(&self, hosts: &[Host], time: f64) -> Vec<usize> {
        sort_by_utilization(hosts, time, true)
    }
}
