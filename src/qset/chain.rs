//! Quantum set chain
//!
//! Owned, growable sequence of quantum sets. Every allocation here is
//! fallible so that running out of memory surfaces as
//! [`ScullError::AllocationFailure`] instead of aborting the process.

use crate::config::Geometry;
use crate::error::{Result, ScullError};

/// One quantum: a fixed-size byte buffer
type Quantum = Box<[u8]>;

/// A group of `qset` quantum slots
///
/// The slot array itself is only allocated on the first write that lands in
/// this set, and each quantum only on the first write that touches it.
#[derive(Debug, Default)]
pub struct QuantumSet {
    data: Option<Box<[Option<Quantum>]>>,
}

impl QuantumSet {
    fn empty() -> Self {
        Self { data: None }
    }

    /// Whether the slot array has been allocated
    pub fn has_slots(&self) -> bool {
        self.data.is_some()
    }

    /// The quantum at `slot`, if it has ever been written
    pub fn quantum(&self, slot: usize) -> Option<&[u8]> {
        self.data.as_ref()?.get(slot)?.as_deref()
    }

    /// The quantum at `slot`, allocating the slot array and the quantum as
    /// needed. Anything allocated stays in place even if the caller later
    /// fails.
    pub fn quantum_mut(&mut self, slot: usize, geometry: Geometry) -> Result<&mut [u8]> {
        let slots = match self.data.take() {
            Some(slots) => slots,
            None => alloc_slots(geometry.qset)?,
        };
        let slots = self.data.insert(slots);

        let len = slots.len();
        let entry = slots.get_mut(slot).ok_or_else(|| {
            ScullError::Config(format!("slot {} out of range for quantum set of {}", slot, len))
        })?;

        let quantum = match entry.take() {
            Some(quantum) => quantum,
            None => alloc_quantum(geometry.quantum)?,
        };
        Ok(&mut entry.insert(quantum)[..])
    }

    /// Number of allocated quanta in this set
    pub fn quantum_count(&self) -> usize {
        self.data
            .as_ref()
            .map(|slots| slots.iter().filter(|q| q.is_some()).count())
            .unwrap_or(0)
    }
}

/// Chain of quantum sets, indexed by item number
#[derive(Debug, Default)]
pub struct QsetChain {
    sets: Vec<QuantumSet>,
}

impl QsetChain {
    /// Create an empty chain
    pub fn new() -> Self {
        Self { sets: Vec::new() }
    }

    /// Walk to quantum set `item`, creating the head and every missing set
    /// on the way. Never allocates quanta.
    ///
    /// On failure, sets created before the failing allocation are kept.
    pub fn follow(&mut self, item: u64) -> Result<&mut QuantumSet> {
        let index = usize::try_from(item).map_err(|_| {
            ScullError::AllocationFailure(format!("quantum set index {} not addressable", item))
        })?;

        if index >= self.sets.len() {
            let missing = (index - self.sets.len()).checked_add(1).ok_or_else(|| {
                ScullError::AllocationFailure(format!("quantum set index {} not addressable", item))
            })?;
            self.sets.try_reserve(missing).map_err(|e| {
                ScullError::AllocationFailure(format!("growing chain to {} sets: {}", item, e))
            })?;
            self.sets.resize_with(index + 1, QuantumSet::empty);
        }

        Ok(&mut self.sets[index])
    }

    /// Quantum set `item`, without creating anything
    pub fn get(&self, item: u64) -> Option<&QuantumSet> {
        let index = usize::try_from(item).ok()?;
        self.sets.get(index)
    }

    /// Number of quantum sets created so far
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Total number of allocated quanta across the chain
    pub fn quantum_count(&self) -> usize {
        self.sets.iter().map(QuantumSet::quantum_count).sum()
    }

    /// Release every set, slot array and quantum
    pub fn clear(&mut self) {
        self.sets = Vec::new();
    }
}

fn alloc_slots(qset: usize) -> Result<Box<[Option<Quantum>]>> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(qset).map_err(|e| {
        ScullError::AllocationFailure(format!("quantum set of {} slots: {}", qset, e))
    })?;
    slots.resize_with(qset, || None);
    Ok(slots.into_boxed_slice())
}

fn alloc_quantum(quantum: usize) -> Result<Quantum> {
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(quantum).map_err(|e| {
        ScullError::AllocationFailure(format!("quantum of {} bytes: {}", quantum, e))
    })?;
    bytes.resize(quantum, 0);
    Ok(bytes.into_boxed_slice())
}
