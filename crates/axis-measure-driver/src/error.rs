//! Error types for AXIS measurement operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for measurement operations
pub type Result<T> = std::result::Result<T, MeasureError>;

/// Errors that can occur while driving the measurement IP
#[derive(Debug, Error)]
pub enum MeasureError {
    /// Device node or resource file not found at the expected path
    #[error("Device not found: {path}")]
    DeviceNotFound {
        /// Path that was checked
        path: PathBuf,
    },

    /// No UIO device carries the requested IP name
    #[error("No UIO device named {name:?}")]
    IpNotFound {
        /// Requested IP name
        name: String,
    },

    /// I/O error during device communication
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Register access outside the mapped window
    #[error("Register offset {offset:#x} out of bounds (limit {limit:#x})")]
    OutOfBounds {
        /// Requested byte offset
        offset: usize,
        /// Size of the mapped window
        limit: usize,
    },

    /// Register access not aligned to 4 bytes
    #[error("Register offset {offset:#x} is not 4-byte aligned")]
    Misaligned {
        /// Requested byte offset
        offset: usize,
    },

    /// Mapping the register window failed
    #[error("Failed to map register window: {reason}")]
    MapFailed {
        /// Reason for failure
        reason: String,
    },

    /// Configuration value could not be used
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Reason for rejection
        reason: String,
    },

    /// A derived metric would divide by zero
    #[error("Empty measurement: {quantity} is zero")]
    EmptyMeasurement {
        /// The zero-valued denominator
        quantity: &'static str,
    },
}

impl MeasureError {
    /// Create a device not found error
    pub fn device_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DeviceNotFound { path: path.into() }
    }

    /// Create an IP not found error
    pub fn ip_not_found(name: impl Into<String>) -> Self {
        Self::IpNotFound { name: name.into() }
    }

    /// Create a map failed error
    pub fn map_failed(reason: impl Into<String>) -> Self {
        Self::MapFailed {
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an empty measurement error
    pub const fn empty(quantity: &'static str) -> Self {
        Self::EmptyMeasurement { quantity }
    }
}
