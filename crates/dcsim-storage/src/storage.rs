//! File storage device model.
//!
//! [`FileStorage`] is implemented by every device. The devices differ only in how long it takes to transfer a
//! file of a given size, the bookkeeping of files, capacity and reservations is shared via [`FileStore`].

use std::fmt::{Display, Formatter};

use dcsim_models::resource::Resource;

use crate::file::File;

/// Error of a storage operation.
#[derive(Clone, Debug, PartialEq)]
pub enum StorageError {
    /// File name is empty.
    InvalidFileName,
    /// File with such name is already stored on the device.
    FileAlreadyExists(String),
    /// File with such name is not stored on the device.
    FileNotFound(String),
    /// There is not enough free space.
    NotEnoughSpace {
        /// Requested amount in MB.
        required: u64,
        /// Free space in MB.
        available: u64,
    },
    /// Less space is reserved than the file being committed needs.
    SpaceNotReserved {
        /// File size in MB.
        required: u64,
        /// Currently reserved amount in MB.
        reserved: u64,
    },
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            StorageError::InvalidFileName => write!(f, "file name is empty"),
            StorageError::FileAlreadyExists(name) => write!(f, "file {} already exists", name),
            StorageError::FileNotFound(name) => write!(f, "file {} is not found", name),
            StorageError::NotEnoughSpace { required, available } => {
                write!(f, "not enough space: required {} MB, available {} MB", required, available)
            }
            StorageError::SpaceNotReserved { required, reserved } => {
                write!(f, "not enough reserved space: required {} MB, reserved {} MB", required, reserved)
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Ordered list of uniquely named files on top of a capacity resource.
#[derive(Clone, Debug)]
pub struct FileStore {
    files: Vec<File>,
    space: Resource,
    reserved: u64,
}

impl FileStore {
    /// Creates empty store with the given capacity in MB.
    pub fn new(capacity: u64) -> Self {
        Self {
            files: Vec::new(),
            space: Resource::new(capacity),
            reserved: 0,
        }
    }

    /// Returns capacity resource of the store.
    pub fn space(&self) -> &Resource {
        &self.space
    }

    /// Returns the amount of space reserved for files which are not added yet.
    pub fn reserved(&self) -> u64 {
        self.reserved
    }

    /// Returns stored files in the order of addition.
    pub fn files(&self) -> &[File] {
        &self.files
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.files.iter().position(|f| f.name() == name)
    }

    /// Returns the file with such name.
    pub fn get(&self, name: &str) -> Option<&File> {
        self.files.iter().find(|f| f.name() == name)
    }

    /// Checks that a file can be added without actually adding it.
    pub fn check_new_file(&self, file: &File) -> Result<(), StorageError> {
        if file.name().is_empty() {
            return Err(StorageError::InvalidFileName);
        }
        if self.get(file.name()).is_some() {
            return Err(StorageError::FileAlreadyExists(file.name().to_string()));
        }
        if !self.space.is_resource_amount_available(file.size()) {
            return Err(StorageError::NotEnoughSpace {
                required: file.size(),
                available: self.space.available(),
            });
        }
        Ok(())
    }

    /// Adds the file and stores the transaction time in it.
    pub fn add(&mut self, mut file: File, transaction_time: f64) -> Result<f64, StorageError> {
        self.check_new_file(&file)?;
        // empty files occupy no space
        if file.size() > 0 {
            self.space.allocate(file.size());
        }
        file.set_transaction_time(transaction_time);
        self.files.push(file);
        Ok(transaction_time)
    }

    /// Removes the file and returns it.
    pub fn remove(&mut self, name: &str, transaction_time: f64) -> Result<File, StorageError> {
        let pos = self
            .position(name)
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()))?;
        let mut file = self.files.remove(pos);
        if file.size() > 0 {
            self.space.deallocate(file.size());
        }
        file.set_transaction_time(transaction_time);
        Ok(file)
    }

    /// Stores the transaction time of an access to the file and returns the file.
    pub fn touch(&mut self, name: &str, transaction_time: f64) -> Option<&File> {
        let pos = self.position(name)?;
        let file = &mut self.files[pos];
        file.set_transaction_time(transaction_time);
        Some(file)
    }

    /// Renames the file, the new name must not be taken.
    pub fn rename(&mut self, name: &str, new_name: &str) -> Result<(), StorageError> {
        if new_name.is_empty() {
            return Err(StorageError::InvalidFileName);
        }
        if self.get(new_name).is_some() {
            return Err(StorageError::FileAlreadyExists(new_name.to_string()));
        }
        let pos = self
            .position(name)
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()))?;
        self.files[pos].set_name(new_name);
        Ok(())
    }

    /// Reserves space for a file which will be added later.
    pub fn reserve(&mut self, size: u64) -> bool {
        if size == 0 || !self.space.allocate(size) {
            return false;
        }
        self.reserved += size;
        true
    }

    /// Releases previously reserved space.
    pub fn release_reserved(&mut self, size: u64) -> Result<(), StorageError> {
        if size > self.reserved {
            return Err(StorageError::SpaceNotReserved {
                required: size,
                reserved: self.reserved,
            });
        }
        if size > 0 {
            self.space.deallocate(size);
            self.reserved -= size;
        }
        Ok(())
    }
}

/// A storage device holding files.
///
/// Every operation with a file returns the time it takes and stores it as the transaction time of the file.
pub trait FileStorage {
    /// Returns the device name.
    fn name(&self) -> &str;

    /// Returns file bookkeeping of the device.
    fn store(&self) -> &FileStore;

    /// Returns mutable file bookkeeping of the device.
    fn store_mut(&mut self) -> &mut FileStore;

    /// Returns the time of transferring a file of the given size to or from the device.
    fn transfer_time(&self, size: u64) -> f64;

    /// Returns the maximum transfer rate in MB/s.
    fn max_transfer_rate(&self) -> f64;

    /// Returns the device capacity in MB.
    fn capacity(&self) -> u64 {
        self.store().space().capacity()
    }

    /// Returns the free space in MB.
    fn available_space(&self) -> u64 {
        self.store().space().available()
    }

    /// Returns the used space in MB, including reservations.
    fn used_space(&self) -> u64 {
        self.store().space().allocated()
    }

    /// Checks whether the device has no free space.
    fn is_full(&self) -> bool {
        self.store().space().is_full()
    }

    /// Returns the number of stored files.
    fn num_files(&self) -> usize {
        self.store().files().len()
    }

    /// Returns names of stored files in the order of addition.
    fn file_names(&self) -> Vec<String> {
        self.store().files().iter().map(|f| f.name().to_string()).collect()
    }

    /// Checks whether a file with such name is stored.
    fn contains_file(&self, name: &str) -> bool {
        self.store().get(name).is_some()
    }

    /// Adds a file and returns the time it takes.
    fn add_file(&mut self, file: File) -> Result<f64, StorageError> {
        let time = self.transfer_time(file.size());
        self.store_mut().add(file, time)
    }

    /// Adds all files and returns the total time.
    ///
    /// Nothing is added if any of the files cannot be added.
    fn add_file_list(&mut self, files: Vec<File>) -> Result<f64, StorageError> {
        let mut names = Vec::with_capacity(files.len());
        for file in &files {
            self.store().check_new_file(file)?;
            if names.contains(&file.name()) {
                return Err(StorageError::FileAlreadyExists(file.name().to_string()));
            }
            names.push(file.name());
        }
        let required: u64 = files.iter().map(|f| f.size()).sum();
        if required > self.available_space() {
            return Err(StorageError::NotEnoughSpace {
                required,
                available: self.available_space(),
            });
        }
        let mut total_time = 0.;
        for file in files {
            total_time += self.add_file(file)?;
        }
        Ok(total_time)
    }

    /// Deletes a file and returns it along with the time it takes.
    fn delete_file(&mut self, name: &str) -> Result<(File, f64), StorageError> {
        let size = self
            .store()
            .get(name)
            .map(|f| f.size())
            .ok_or_else(|| StorageError::FileNotFound(name.to_string()))?;
        let time = self.transfer_time(size);
        let file = self.store_mut().remove(name, time)?;
        Ok((file, time))
    }

    /// Reads a file, its transaction time is updated with the time of the read.
    fn get_file(&mut self, name: &str) -> Option<&File> {
        let size = self.store().get(name)?.size();
        let time = self.transfer_time(size);
        self.store_mut().touch(name, time)
    }

    /// Renames a file.
    fn rename_file(&mut self, name: &str, new_name: &str) -> Result<(), StorageError> {
        self.store_mut().rename(name, new_name)
    }

    /// Reserves space for a file which will be added with [`add_reserved_file`](Self::add_reserved_file).
    fn reserve_space(&mut self, size: u64) -> bool {
        self.store_mut().reserve(size)
    }

    /// Adds a file for which the space was reserved before.
    ///
    /// The reservation is released and the file is added with the usual capacity check, on failure the
    /// reservation is restored.
    fn add_reserved_file(&mut self, file: File) -> Result<f64, StorageError> {
        let size = file.size();
        self.store_mut().release_reserved(size)?;
        match self.add_file(file) {
            Ok(time) => Ok(time),
            Err(e) => {
                self.store_mut().reserve(size);
                Err(e)
            }
        }
    }

    /// Checks whether a file of the given size could be stored if the replicas were deleted.
    fn has_potential_available_space(&self, size: u64) -> bool {
        if self.available_space() >= size {
            return true;
        }
        let deletable: u64 = self
            .store()
            .files()
            .iter()
            .filter(|f| !f.is_master && !f.read_only)
            .map(|f| f.size())
            .sum();
        self.available_space() + deletable >= size
    }
}
