//! Order in which hosts are tried for a VM placement.

use dyn_clone::{clone_trait_object, DynClone};

use crate::core::host::Host;
use crate::core::placement_strategies::best_fit::BestFit;
use crate::core::placement_strategies::first_fit::FirstFit;
use crate::core::placement_strategies::worst_fit::WorstFit;

/// Trait for implementation of placement strategies.
///
/// The strategy only ranks hosts, the allocation policy takes the first suitable host in this order.
pub trait PlacementStrategy: DynClone {
    /// Returns indices of `hosts` in order of preference.
    fn order_hosts(&self, hosts: &[Host], time: f64) -> Vec<usize>;
}

clone_trait_object!(PlacementStrategy);

pub fn placement_strategy_resolver(name: &str) -> Option<Box<dyn PlacementStrategy>> {
    match name {
        "FirstFit" => Some(Box::new(FirstFit::new())),
        "BestFit" => Some(Box::new(BestFit::new())),
        "WorstFit" => Some(Box::new(WorstFit::new())),
        _ => None,
    }
}

pub(crate) fn sort_by_utilization(hosts: &[Host], time: f64, descending: bool) -> Vec<usize> {
    let utilization: Vec<f64> = hosts.iter().map(|h| h.cpu_utilization(time)).collect();
    let mut order: Vec<usize> = (0..hosts.len()).collect();
    // stable sort keeps host list order for equal utilization
    if descending {
        order.sort_by(|a, b| utilization[*b].total_cmp(&utilization[*a]));
    } else {
        order.sort_by(|a, b| utilization[*a].total_cmp(&utilization[*b]));
    }
    order
}
