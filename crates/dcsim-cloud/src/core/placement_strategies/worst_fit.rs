//! Worst Fit strategy.

use crate::core::host::Host;
use crate::core::placement_strategy::{sort_by_utilization, PlacementStrategy};

/// Uses the least loaded (by CPU utilization) suitable host, which spreads the load between hosts.
#[derive(Clone, Default)]
pub struct WorstFit;

impl WorstFit {
    pub fn new() -> Self {
        Default::default()
    }
}

impl PlacementStrategy for WorstFit {
    fn order_hosts(&self, hosts: &[Host], time: f64) -> Vec<usize> {
        sort_by_utilization(hosts, time, false)
    }
}
