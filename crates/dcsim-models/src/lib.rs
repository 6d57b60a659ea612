#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub mod error;
pub mod power;
pub mod resource;
pub mod utilization;
