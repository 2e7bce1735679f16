//! Store Module
//!
//! The storage engine behind one device.
//!
//! ## Responsibilities
//! - Own the quantum set chain, the current geometry and the store size
//! - Serialize read, write and trim behind one exclusive lock
//! - Interruptible lock waits via [`CancelToken`]
//! - Copy to and from caller buffers through [`UserBuf`] / [`UserBufMut`]
//!
//! ## Read / Write Contract
//! ```text
//!   read(pos, buf)                       write(pos, buf)
//!   ──────────────                       ───────────────
//!   pos >= size      → 0                 allocate set / slots / quantum
//!   clamp to size                        clip to end of quantum
//!   hole             → 0                 copy in, pos += n
//!   clip to end of quantum               size = max(size, pos)
//!   copy out, pos += n
//! ```
//! Neither call crosses a quantum boundary; callers loop.

mod cancel;
mod device;
mod uaccess;

pub use cancel::CancelToken;
pub use device::{Store, StoreStats};
pub use uaccess::{UserBuf, UserBufMut};
