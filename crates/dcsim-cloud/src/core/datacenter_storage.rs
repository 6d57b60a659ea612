//! Storage devices of a datacenter.

use dcsim_storage::{File, FileStorage, StorageError};

/// Ordered list of storage devices holding the files required by cloudlets.
#[derive(Default)]
pub struct DatacenterStorage {
    devices: Vec<Box<dyn FileStorage>>,
}

impl DatacenterStorage {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add_storage(&mut self, device: Box<dyn FileStorage>) {
        self.devices.push(device);
    }

    pub fn devices(&self) -> &[Box<dyn FileStorage>] {
        &self.devices
    }

    pub fn capacity(&self) -> u64 {
        self.devices.iter().map(|d| d.capacity()).sum()
    }

    pub fn contains_file(&self, name: &str) -> bool {
        self.devices.iter().any(|d| d.contains_file(name))
    }

    /// Stores the file on the first device with enough free space and returns the time it takes.
    ///
    /// File names are unique across all devices.
    pub fn add_file(&mut self, file: File) -> Result<f64, StorageError> {
        if self.contains_file(file.name()) {
            return Err(StorageError::FileAlreadyExists(file.name().to_string()));
        }
        let required = file.size();
        match self.devices.iter_mut().find(|d| d.available_space() >= required) {
            Some(device) => device.add_file(file),
            None => Err(StorageError::NotEnoughSpace {
                required,
                available: self.devices.iter().map(|d| d.available_space()).max().unwrap_or(0),
            }),
        }
    }

    /// Removes the file from the device holding it.
    pub fn delete_file(&mut self, name: &str) -> Result<File, StorageError> {
        match self.devices.iter_mut().find(|d| d.contains_file(name)) {
            Some(device) => device.delete_file(name).map(|(file, _)| file),
            None => Err(StorageError::FileNotFound(name.to_string())),
        }
    }

    /// Time needed to read the files, each one from the first device holding it.
    ///
    /// Files not found on any device take no time.
    pub fn predict_file_transfer_time(&self, names: &[String]) -> f64 {
        let mut time = 0.;
        for name in names {
            let found = self
                .devices
                .iter()
                .find_map(|d| d.store().get(name).map(|f| (f.size(), d.max_transfer_rate())));
            if let Some((size, rate)) = found {
                if rate > 0. {
                    time += size as f64 / rate;
                }
            }
        }
        time
    }
}
