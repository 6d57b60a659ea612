//! File stored on a storage device.

use serde::Serialize;

/// File with a name unique within a storage device and a size in MB.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct File {
    name: String,
    size: u64,
    /// Whether this is the master copy or a replica.
    pub is_master: bool,
    /// Read-only files are never removed to free space for other files.
    pub read_only: bool,
    transaction_time: f64,
}

impl File {
    /// Creates a master copy of a file.
    pub fn new(name: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            size,
            is_master: true,
            read_only: false,
            transaction_time: 0.,
        }
    }

    /// Creates a replica of the given file.
    pub fn replica_of(file: &File) -> Self {
        Self {
            is_master: false,
            transaction_time: 0.,
            ..file.clone()
        }
    }

    /// Returns the file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the file size in MB.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the duration of the last storage operation with this file.
    pub fn transaction_time(&self) -> f64 {
        self.transaction_time
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub(crate) fn set_transaction_time(&mut self, time: f64) {
        self.transaction_time = time;
    }
}
