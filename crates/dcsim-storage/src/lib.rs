#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod file;
pub mod harddrive;
pub mod san;
pub mod storage;

pub use file::File;
pub use harddrive::HarddriveStorage;
pub use san::SanStorage;
pub use storage::{FileStorage, StorageError};
