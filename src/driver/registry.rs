//! Device Registry
//!
//! Creates the configured devices and hands out open files for them.

use std::sync::Arc;

use crate::config::Config;
use crate::error::{Result, ScullError};
use crate::store::{CancelToken, Store};

use super::{AccessMode, OpenFile};

/// The set of scull devices, numbered by minor
///
/// ## Lifecycle
/// - `new()` creates `nr_devs` empty stores with the configured geometry
/// - `open()` maps a minor to its store and applies the open policy
/// - `shutdown()` interrupts every caller blocked on a device lock
pub struct DeviceRegistry {
    first_minor: u32,
    devices: Vec<Arc<Store>>,

    /// Shared by every open file; fired on shutdown
    cancel: CancelToken,
}

impl DeviceRegistry {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        let geometry = config.geometry();
        let devices = (0..config.nr_devs)
            .map(|_| {
                Store::new(geometry)
                    .map(|store| Arc::new(store.with_poll_interval(config.lock_poll_interval())))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            first_minor = config.first_minor,
            nr_devs = config.nr_devs,
            quantum = geometry.quantum,
            qset = geometry.qset,
            "scull devices initialized"
        );

        Ok(Self {
            first_minor: config.first_minor,
            devices,
            cancel: CancelToken::new(),
        })
    }

    /// Open device `minor`
    ///
    /// A write-only open truncates the device before returning.
    pub fn open(&self, minor: u32, mode: AccessMode) -> Result<OpenFile> {
        let store = self.device(minor).ok_or(ScullError::NoDevice(minor))?;

        if mode == AccessMode::WriteOnly {
            tracing::debug!(minor, "write-only open, truncating device");
        }

        Ok(OpenFile::open(Arc::clone(store), minor, mode, self.cancel.clone()))
    }

    /// The store behind `minor`, if it exists
    pub fn device(&self, minor: u32) -> Option<&Arc<Store>> {
        let index = minor.checked_sub(self.first_minor)?;
        self.devices.get(index as usize)
    }

    /// Minor numbers served by this registry
    pub fn minors(&self) -> std::ops::Range<u32> {
        self.first_minor..self.first_minor + self.devices.len() as u32
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Interrupt every blocked lock wait on every device
    pub fn shutdown(&self) {
        tracing::info!("interrupting pending device operations");
        self.cancel.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
