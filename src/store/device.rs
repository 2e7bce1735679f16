//! Store implementation
//!
//! One store per device: a quantum set chain plus its geometry and size,
//! all behind a single mutex.

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::config::Geometry;
use crate::error::{Result, ScullError};
use crate::qset::{Position, QsetChain};

use super::{CancelToken, UserBuf, UserBufMut};

/// Default sleep between cancellation checks while waiting for the lock
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Snapshot of a store's shape and memory use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    /// End of the readable range (highest written offset + 1)
    pub size: u64,

    /// Geometry currently in effect
    pub geometry: Geometry,

    /// Quantum sets created so far
    pub qsets: usize,

    /// Quanta allocated so far
    pub quanta: usize,
}

/// Sparse, lazily allocated byte store
///
/// ## Concurrency Model: one coarse lock
///
/// Every operation (read, write, trim, reconfigure) holds `state` for its
/// whole duration, so operations on one store never overlap. Different
/// stores share nothing.
///
/// Read/write/reconfigure wait interruptibly: a waiter gives up with
/// [`ScullError::Interrupted`] once its [`CancelToken`] fires. Trim never
/// fails, so it waits unconditionally.
pub struct Store {
    /// Geometry restored by every trim
    defaults: Geometry,

    /// How long a waiter blocks before re-checking its cancel token
    poll_interval: Duration,

    state: Mutex<StoreState>,
}

struct StoreState {
    geometry: Geometry,
    size: u64,
    chain: QsetChain,
}

impl Store {
    /// Create an empty store with the given default geometry
    pub fn new(defaults: Geometry) -> Result<Self> {
        defaults.validate()?;

        Ok(Self {
            defaults,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: Mutex::new(StoreState {
                geometry: defaults,
                size: 0,
                chain: QsetChain::new(),
            }),
        })
    }

    /// Override the lock wait poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Read up to `buf.len()` bytes at `*pos`
    ///
    /// A single call never crosses a quantum boundary and never reads past
    /// the store size. Returns 0 at end of store and also inside a hole
    /// (a quantum that was never written); in both cases `*pos` is left
    /// alone. On success `*pos` advances by the returned count.
    pub fn read<B>(&self, pos: &mut u64, buf: &mut B, cancel: &CancelToken) -> Result<usize>
    where
        B: UserBufMut + ?Sized,
    {
        let state = self.lock(cancel)?;

        if *pos >= state.size {
            return Ok(0);
        }
        let available = usize::try_from(state.size - *pos).unwrap_or(usize::MAX);
        let count = buf.len().min(available);

        let geometry = state.geometry;
        let at = Position::locate(*pos, geometry);

        // Holes are not filled in
        let quantum = match state.chain.get(at.item).and_then(|set| set.quantum(at.slot)) {
            Some(quantum) => quantum,
            None => return Ok(0),
        };

        let count = count.min(at.room(geometry));
        buf.copy_to_user(&quantum[at.byte..at.byte + count])?;

        *pos += count as u64;
        Ok(count)
    }

    /// Write up to `buf.len()` bytes at `*pos`
    ///
    /// Missing quantum sets, slot arrays and quanta on the path to `*pos`
    /// are allocated first. The copy is clipped at the end of the target
    /// quantum, so the returned count may be shorter than the buffer; the
    /// caller issues another write at the advanced position for the rest.
    ///
    /// If the copy faults, whatever was allocated stays allocated and
    /// `*pos` and the size are unchanged.
    pub fn write<B>(&self, pos: &mut u64, buf: &B, cancel: &CancelToken) -> Result<usize>
    where
        B: UserBuf + ?Sized,
    {
        let mut guard = self.lock(cancel)?;
        let state = &mut *guard;

        if buf.is_empty() {
            return Ok(0);
        }

        let geometry = state.geometry;
        let at = Position::locate(*pos, geometry);
        let count = buf.len().min(at.room(geometry));
        let end = pos.checked_add(count as u64).ok_or_else(|| {
            ScullError::Config(format!("write of {} bytes at {} overflows offset", count, *pos))
        })?;

        let quantum = state.chain.follow(at.item)?.quantum_mut(at.slot, geometry)?;
        buf.copy_from_user(&mut quantum[at.byte..at.byte + count])?;

        *pos = end;
        if end > state.size {
            state.size = end;
        }
        Ok(count)
    }

    /// Release all memory, zero the size and restore the default geometry
    pub fn trim(&self) {
        self.state.lock().trim(self.defaults);
    }

    /// Change the geometry of an empty store
    ///
    /// The new geometry stays in effect until the next trim.
    pub fn reconfigure(&self, geometry: Geometry, cancel: &CancelToken) -> Result<()> {
        geometry.validate()?;
        let mut state = self.lock(cancel)?;

        if state.size != 0 || !state.chain.is_empty() {
            return Err(ScullError::Config(format!(
                "cannot change geometry of a store holding {} bytes",
                state.size
            )));
        }
        state.geometry = geometry;
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn size(&self) -> u64 {
        self.state.lock().size
    }

    /// Geometry currently in effect
    pub fn geometry(&self) -> Geometry {
        self.state.lock().geometry
    }

    /// Geometry restored by trim
    pub fn defaults(&self) -> Geometry {
        self.defaults
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.state.lock();
        StoreStats {
            size: state.size,
            geometry: state.geometry,
            qsets: state.chain.len(),
            quanta: state.chain.quantum_count(),
        }
    }

    /// Take the lock, giving up if `cancel` fires while waiting
    fn lock(&self, cancel: &CancelToken) -> Result<MutexGuard<'_, StoreState>> {
        if let Some(guard) = self.state.try_lock() {
            return Ok(guard);
        }

        loop {
            if cancel.is_cancelled() {
                return Err(ScullError::Interrupted);
            }
            if let Some(guard) = self.state.try_lock_for(self.poll_interval) {
                return Ok(guard);
            }
        }
    }
}

impl StoreState {
    fn trim(&mut self, defaults: Geometry) {
        self.chain.clear();
        self.size = 0;
        self.geometry = defaults;
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("defaults", &self.defaults)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
