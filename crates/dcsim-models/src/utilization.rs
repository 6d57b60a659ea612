//! Resource utilization models.

use dyn_clone::{clone_trait_object, DynClone};
use rand::prelude::*;
use rand_pcg::Pcg64;

/// A resource utilization model is a function which defines the fraction of requested resource
/// actually used by a workload at the given simulation time.
pub trait UtilizationModel: DynClone {
    /// Returns utilization in `[0, 1]` at the given time.
    fn utilization(&self, time: f64) -> f64;
}

clone_trait_object!(UtilizationModel);

/// The simplest utilization model, the constant utilization.
#[derive(Clone)]
pub struct ConstantUtilizationModel {
    utilization: f64,
}

impl ConstantUtilizationModel {
    /// Creates model with specified utilization, which is clamped to `[0, 1]`.
    pub fn new(utilization: f64) -> Self {
        Self {
            utilization: utilization.clamp(0., 1.),
        }
    }
}

impl UtilizationModel for ConstantUtilizationModel {
    fn utilization(&self, _time: f64) -> f64 {
        self.utilization
    }
}

/// Workload always uses all requested resources.
#[derive(Clone, Default)]
pub struct FullUtilizationModel;

impl UtilizationModel for FullUtilizationModel {
    fn utilization(&self, _time: f64) -> f64 {
        1.
    }
}

/// Utilization is drawn uniformly from `[0, 1)`.
///
/// The value depends only on the seed and the time, so repeated queries for the same time agree
/// and runs with the same seed are reproducible.
#[derive(Clone)]
pub struct StochasticUtilizationModel {
    seed: u64,
}

impl StochasticUtilizationModel {
    /// Creates model with specified seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl UtilizationModel for StochasticUtilizationModel {
    fn utilization(&self, time: f64) -> f64 {
        let mut rand = Pcg64::seed_from_u64(self.seed ^ time.to_bits());
        rand.gen_range(0.0..1.0)
    }
}
