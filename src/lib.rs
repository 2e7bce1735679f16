//! # scull
//!
//! A sparse, in-memory byte store behind a minimal character-device
//! interface:
//! - Positional read/write into a logical stream of unbounded length
//! - Memory allocated lazily, one quantum at a time, only where written
//! - Truncate-on-write-only-open releases everything
//! - One coarse, interruptible lock per device
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 TCP Server / OpenFile callers                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ open(minor, mode) / read / write
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    DeviceRegistry                            │
//! │        (minor → Store, write-only open truncates)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Store                                 │
//! │         (Mutex: geometry, size, quantum set chain)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ offset → (item, slot, byte)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │    QsetChain ──▶ QuantumSet[item] ──▶ quantum[slot][byte]    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod qset;
pub mod store;
pub mod driver;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ScullError, Result};
pub use config::{Config, Geometry};
pub use store::{CancelToken, Store};
pub use driver::{AccessMode, DeviceRegistry, OpenFile};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of scull
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
