//! Quantum Set Module
//!
//! Physical storage for a device: a chain of quantum sets, each holding up to
//! `qset` quantum-sized blocks.
//!
//! ## Responsibilities
//! - Map a byte offset to (quantum set, slot, byte) coordinates
//! - Grow the chain on demand when an offset lands past its end
//! - Allocate slot arrays and blocks lazily, only when written
//!
//! ## Layout
//! ```text
//!   chain[0]                 chain[1]                 chain[n]
//! ┌──────────────┐         ┌──────────────┐         ┌──────────────┐
//! │ slots[0] ──▶ quantum   │ (no slots)   │   ...   │ slots[0] ──▶ quantum
//! │ slots[1]  -  │         └──────────────┘         │ slots[1] ──▶ quantum
//! │ ...          │                                  │ ...          │
//! │ slots[q-1]   │                                  │ slots[q-1] - │
//! └──────────────┘                                  └──────────────┘
//! ```
//! Every level is owned by the level above it, so dropping the chain frees
//! everything.

mod addr;
mod chain;

pub use addr::Position;
pub use chain::{QsetChain, QuantumSet};
