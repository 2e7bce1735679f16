//! Error types for scull
//!
//! Provides a unified error type for the store, the device layer and the
//! network glue.

use thiserror::Error;

/// Result type alias using ScullError
pub type Result<T> = std::result::Result<T, ScullError>;

/// Unified error type for scull operations
#[derive(Debug, Error)]
pub enum ScullError {
    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// Lock acquisition was cancelled; nothing changed, retry the whole call
    #[error("Interrupted while waiting for device lock")]
    Interrupted,

    /// Caller buffer could not be accessed during the copy
    #[error("Bad address: {0}")]
    Fault(String),

    #[error("Out of memory: {0}")]
    AllocationFailure(String),

    // -------------------------------------------------------------------------
    // Device Errors
    // -------------------------------------------------------------------------
    #[error("No such device: minor {0}")]
    NoDevice(u32),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // I/O and Network Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl ScullError {
    /// Conventional errno for this error, as a char driver would return it
    pub fn errno(&self) -> i32 {
        match self {
            ScullError::Interrupted => ERESTARTSYS,
            ScullError::Fault(_) => EFAULT,
            ScullError::AllocationFailure(_) => ENOMEM,
            ScullError::NoDevice(_) => ENODEV,
            ScullError::Config(_) => EINVAL,
            ScullError::Io(e) => e.raw_os_error().unwrap_or(EIO),
            ScullError::Network(_) => EIO,
            ScullError::Protocol(_) => EPROTO,
        }
    }

    /// Whether the caller should simply retry the same call
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScullError::Interrupted)
    }
}

const EIO: i32 = 5;
const ENOMEM: i32 = 12;
const EFAULT: i32 = 14;
const ENODEV: i32 = 19;
const EINVAL: i32 = 22;
const EPROTO: i32 = 71;
const ERESTARTSYS: i32 = 512;
