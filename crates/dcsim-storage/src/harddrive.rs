//! Hard drive storage.

use crate::storage::{FileStorage, FileStore};

/// Default maximum transfer rate in MB/s.
pub const DEFAULT_MAX_TRANSFER_RATE: f64 = 133.;
/// Default rotational latency in seconds.
pub const DEFAULT_LATENCY: f64 = 0.00417;
/// Default average seek time in seconds.
pub const DEFAULT_AVG_SEEK_TIME: f64 = 0.009;

/// Local hard drive.
///
/// Transferring a file takes `avg_seek_time + latency + size / max_transfer_rate` seconds.
#[derive(Clone, Debug)]
pub struct HarddriveStorage {
    name: String,
    store: FileStore,
    max_transfer_rate: f64,
    latency: f64,
    avg_seek_time: f64,
}

impl HarddriveStorage {
    /// Creates hard drive with the given capacity in MB and default performance parameters.
    pub fn new(name: &str, capacity: u64) -> Self {
        Self {
            name: name.to_string(),
            store: FileStore::new(capacity),
            max_transfer_rate: DEFAULT_MAX_TRANSFER_RATE,
            latency: DEFAULT_LATENCY,
            avg_seek_time: DEFAULT_AVG_SEEK_TIME,
        }
    }

    /// Sets maximum transfer rate in MB/s, the rate must be positive.
    pub fn set_max_transfer_rate(&mut self, rate: f64) -> bool {
        if !(rate > 0.) {
            return false;
        }
        self.max_transfer_rate = rate;
        true
    }

    /// Sets rotational latency in seconds.
    pub fn set_latency(&mut self, latency: f64) -> bool {
        if !(latency >= 0.) {
            return false;
        }
        self.latency = latency;
        true
    }

    /// Sets average seek time in seconds.
    pub fn set_avg_seek_time(&mut self, seek_time: f64) -> bool {
        if !(seek_time >= 0.) {
            return false;
        }
        self.avg_seek_time = seek_time;
        true
    }

    /// Returns rotational latency.
    pub fn latency(&self) -> f64 {
        self.latency
    }

    /// Returns average seek time.
    pub fn avg_seek_time(&self) -> f64 {
        self.avg_seek_time
    }
}

impl FileStorage for HarddriveStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn store(&self) -> &FileStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut FileStore {
        &mut self.store
    }

    fn transfer_time(&self, size: u64) -> f64 {
        self.avg_seek_time + self.latency + size as f64 / self.max_transfer_rate
    }

    fn max_transfer_rate(&self) -> f64 {
        self.max_transfer_rate
    }
}
