//! Driver Module
//!
//! Device-layer glue around the stores: device numbering, open policy and
//! per-open file position.
//!
//! ## Open Policy
//! | mode        | effect on the store |
//! |-------------|---------------------|
//! | read-only   | none                |
//! | write-only  | truncate            |
//! | read-write  | none                |

mod file;
mod registry;

pub use file::{open, AccessMode, OpenFile, O_ACCMODE, O_RDONLY, O_RDWR, O_WRONLY};
pub use registry::DeviceRegistry;
