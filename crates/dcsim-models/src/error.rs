//! Errors of model construction.

use std::fmt::{Display, Formatter};

/// Error returned when a model is created with invalid parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelError {
    /// Parameter value is outside of its valid range.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ModelError::InvalidParameter { name, value } => write!(f, "invalid value of {}: {}", name, value),
        }
    }
}

impl std::error::Error for ModelError {}
