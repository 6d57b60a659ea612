//! CPU view of a MIPS share list.

/// A set of identical cores derived from the MIPS share granted to a VM.
///
/// Used to split capacity between workloads when they demand more cores than the processor has.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Processor {
    core_mips: f64,
    cores: u32,
}

impl Processor {
    pub fn new(core_mips: f64, cores: u32) -> Self {
        Self { core_mips, cores }
    }

    /// Builds processor from per-core MIPS share, cores with zero share are not counted.
    pub fn from_mips_share(mips_share: &[f64]) -> Self {
        let working: Vec<f64> = mips_share.iter().copied().filter(|mips| *mips > 0.).collect();
        if working.is_empty() {
            return Self::default();
        }
        let total: f64 = working.iter().sum();
        Self {
            core_mips: total / working.len() as f64,
            cores: working.len() as u32,
        }
    }

    pub fn core_mips(&self) -> f64 {
        self.core_mips
    }

    pub fn cores(&self) -> u32 {
        self.cores
    }

    pub fn total_mips(&self) -> f64 {
        self.core_mips * self.cores as f64
    }

    /// Returns MIPS available to each of `demanded_cores` cores.
    ///
    /// When more cores are demanded than exist, the total capacity is shared equally among them.
    pub fn available_mips_per_core(&self, demanded_cores: u32) -> f64 {
        if demanded_cores > self.cores {
            self.total_mips() / demanded_cores as f64
        } else {
            self.core_mips
        }
    }
}
