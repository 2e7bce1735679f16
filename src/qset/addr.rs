//! Offset addressing
//!
//! Pure mapping from a logical byte offset to chain coordinates.

use crate::config::Geometry;

/// Coordinates of one byte inside the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// Index of the quantum set in the chain
    pub item: u64,

    /// Slot index inside the quantum set
    pub slot: usize,

    /// Byte offset inside the quantum
    pub byte: usize,
}

impl Position {
    /// Locate `offset` for the given geometry
    ///
    /// ```text
    /// item_size = quantum * qset
    /// item      = offset / item_size
    /// rest      = offset % item_size
    /// slot      = rest / quantum
    /// byte      = rest % quantum
    /// ```
    pub fn locate(offset: u64, geometry: Geometry) -> Self {
        let item_size = geometry.item_size();
        let quantum = geometry.quantum as u64;

        let item = offset / item_size;
        let rest = offset % item_size;

        // rest < quantum * qset, so both fit in usize
        Self {
            item,
            slot: (rest / quantum) as usize,
            byte: (rest % quantum) as usize,
        }
    }

    /// Bytes left in this quantum starting at `byte`
    pub fn room(&self, geometry: Geometry) -> usize {
        geometry.quantum - self.byte
    }
}
