//! Cancellation token for interruptible lock waits

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that interrupts callers blocked on a store lock
///
/// Clones share the same flag. Only waiters are affected: an uncontended
/// lock is still taken even after the token has fired.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interrupt every current and future waiter holding this token
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Re-arm the token after a cancellation has been handled
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}
