//! Error types for the device migration tool
//!
//! This module defines the error types used throughout the transfer core.
//! Expected conditions (a missing remote file, nothing to export) are not
//! errors; transports report those as `false` / `None` instead.

use thiserror::Error;

/// Main error type for the device migration tool
#[derive(Error, Debug)]
pub enum TransferError {
    /// The identifier does not belong to any known backend
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The backend does not implement this capability at all
    #[error("Operation not supported: {0}")]
    Unsupported(String),

    /// General device communication error
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Access to the device was denied
    #[error("Access denied. Please unlock the device and accept the trust/debugging prompt.")]
    AccessDenied,

    /// General I/O error
    #[error("IO error: {0}")]
    IoError(String),

    /// Failed to decode or encode an interchange/media format
    #[error("Conversion failed: {0}")]
    ConversionError(String),

    /// Error reading a native message store
    #[error("Message store error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Error reading or writing JSON interchange files
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransferError {
    /// Whether this error means the capability is absent, not that it failed
    pub fn is_unsupported(&self) -> bool {
        matches!(self, TransferError::Unsupported(_))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TransferError>;

impl From<std::io::Error> for TransferError {
    fn from(err: std::io::Error) -> Self {
        TransferError::IoError(err.to_string())
    }
}
