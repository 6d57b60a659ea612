//! Storage area network.

use crate::harddrive::HarddriveStorage;
use crate::storage::{FileStorage, FileStore};

/// Storage accessed over the network.
///
/// The transfer time of the underlying disk is extended by the network latency and the time to send the file
/// over the link with the given bandwidth.
#[derive(Clone, Debug)]
pub struct SanStorage {
    disk: HarddriveStorage,
    /// Mbit/s
    bandwidth: f64,
    network_latency: f64,
}

impl SanStorage {
    /// Creates SAN storage with capacity in MB, network bandwidth in Mbit/s and network latency in seconds.
    ///
    /// Returns `None` if bandwidth is not positive or latency is negative.
    pub fn new(name: &str, capacity: u64, bandwidth: f64, network_latency: f64) -> Option<Self> {
        if !(bandwidth > 0.) || !(network_latency >= 0.) {
            return None;
        }
        Some(Self {
            disk: HarddriveStorage::new(name, capacity),
            bandwidth,
            network_latency,
        })
    }

    /// Returns the underlying disk, e.g. to change its performance parameters.
    pub fn disk_mut(&mut self) -> &mut HarddriveStorage {
        &mut self.disk
    }

    /// Returns network bandwidth in Mbit/s.
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Returns network latency in seconds.
    pub fn network_latency(&self) -> f64 {
        self.network_latency
    }
}

impl FileStorage for SanStorage {
    fn name(&self) -> &str {
        self.disk.name()
    }

    fn store(&self) -> &FileStore {
        self.disk.store()
    }

    fn store_mut(&mut self) -> &mut FileStore {
        self.disk.store_mut()
    }

    fn transfer_time(&self, size: u64) -> f64 {
        self.disk.transfer_time(size) + self.network_latency + size as f64 * 8. / self.bandwidth
    }

    fn max_transfer_rate(&self) -> f64 {
        self.disk.max_transfer_rate()
    }
}
