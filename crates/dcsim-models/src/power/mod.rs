//! Host power consumption models.

pub mod models;
pub mod power_model;

pub use power_model::PowerModel;
