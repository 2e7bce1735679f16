//! Open files
//!
//! An [`OpenFile`] is what a file descriptor on a scull device points at:
//! the device, the access mode it was opened with and a file position.

use std::sync::Arc;

use crate::error::{Result, ScullError};
use crate::store::{CancelToken, Store};

/// Mask of the access mode bits in open flags
pub const O_ACCMODE: u32 = 0o3;
pub const O_RDONLY: u32 = 0o0;
pub const O_WRONLY: u32 = 0o1;
pub const O_RDWR: u32 = 0o2;

/// How a device was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AccessMode {
    ReadOnly = 0,
    WriteOnly = 1,
    ReadWrite = 2,
}

impl AccessMode {
    /// Decode the access mode from POSIX open flags
    pub fn from_flags(flags: u32) -> Result<Self> {
        match flags & O_ACCMODE {
            O_RDONLY => Ok(AccessMode::ReadOnly),
            O_WRONLY => Ok(AccessMode::WriteOnly),
            O_RDWR => Ok(AccessMode::ReadWrite),
            other => Err(ScullError::Config(format!("invalid access mode {:#o}", other))),
        }
    }
}

/// Apply the open policy to a store: opening write-only truncates it
///
/// Read-only and read-write opens leave the contents alone. Never fails.
pub fn open(store: &Store, mode: AccessMode) {
    if mode == AccessMode::WriteOnly {
        store.trim();
    }
}

/// A device opened with a given access mode
///
/// Reads and writes go through the store's own clipping rules; the file
/// only carries the position between calls.
#[derive(Debug)]
pub struct OpenFile {
    store: Arc<Store>,
    minor: u32,
    mode: AccessMode,
    pos: u64,
    cancel: CancelToken,
}

impl OpenFile {
    /// Open `store` under `minor`, truncating it if `mode` is write-only
    pub fn open(store: Arc<Store>, minor: u32, mode: AccessMode, cancel: CancelToken) -> Self {
        open(&store, mode);

        Self {
            store,
            minor,
            mode,
            pos: 0,
            cancel,
        }
    }

    /// Read at the current position (one quantum at most)
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.store.read(&mut self.pos, buf, &self.cancel)
    }

    /// Write at the current position (one quantum at most)
    pub fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.store.write(&mut self.pos, buf, &self.cancel)
    }

    /// Move to `offset`, then read
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.pos = offset;
        self.read(buf)
    }

    /// Move to `offset`, then write
    pub fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<usize> {
        self.pos = offset;
        self.write(buf)
    }

    /// Write the whole buffer, one quantum-clipped write at a time
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let written = self.write(buf)?;
            buf = &buf[written..];
        }
        Ok(())
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn set_pos(&mut self, pos: u64) {
        self.pos = pos;
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }
}
