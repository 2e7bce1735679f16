//! Configuration for scull
//!
//! Centralized configuration with sensible defaults. Stores capture their
//! default [`Geometry`] from here at construction time; there is no global
//! mutable state.

use std::time::Duration;

use crate::error::{Result, ScullError};

/// Default bytes per quantum
pub const DEFAULT_QUANTUM: usize = 4000;

/// Default quantum slots per quantum set
pub const DEFAULT_QSET: usize = 1000;

/// Shape of a store: block size and blocks per group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Capacity in bytes of one quantum (block)
    pub quantum: usize,

    /// Number of quantum slots per quantum set (group)
    pub qset: usize,
}

impl Geometry {
    /// Create a geometry, rejecting zero-sized or unaddressable dimensions
    pub fn new(quantum: usize, qset: usize) -> Result<Self> {
        let geometry = Self { quantum, qset };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Bytes covered by one quantum set
    pub fn item_size(&self) -> u64 {
        self.quantum as u64 * self.qset as u64
    }

    pub fn validate(&self) -> Result<()> {
        if self.quantum == 0 {
            return Err(ScullError::Config("quantum must be greater than 0".to_string()));
        }
        if self.qset == 0 {
            return Err(ScullError::Config("qset must be greater than 0".to_string()));
        }
        if (self.quantum as u64).checked_mul(self.qset as u64).is_none() {
            return Err(ScullError::Config(format!(
                "quantum set of {} x {} bytes overflows a 64-bit offset",
                self.qset, self.quantum
            )));
        }
        Ok(())
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            qset: DEFAULT_QSET,
        }
    }
}

/// Main configuration for a scull instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// Default quantum size; restored by every truncate
    pub quantum: usize,

    /// Default quantum set width; restored by every truncate
    pub qset: usize,

    /// Number of devices to create
    pub nr_devs: u32,

    /// Minor number of the first device
    pub first_minor: u32,

    /// How long a blocked lock waiter sleeps between cancellation checks
    pub lock_poll_interval_ms: u64,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of connection worker threads
    pub worker_threads: usize,

    /// Max accepted connections waiting for a worker
    pub max_connections: usize,

    /// Connection read timeout (milliseconds)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            qset: DEFAULT_QSET,
            nr_devs: 1,
            first_minor: 0,
            lock_poll_interval_ms: 10,
            listen_addr: "127.0.0.1:7070".to_string(),
            worker_threads: 4,
            max_connections: 64,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Default geometry for every device
    pub fn geometry(&self) -> Geometry {
        Geometry {
            quantum: self.quantum,
            qset: self.qset,
        }
    }

    pub fn lock_poll_interval(&self) -> Duration {
        Duration::from_millis(self.lock_poll_interval_ms.max(1))
    }

    /// Check the configuration before devices are created
    pub fn validate(&self) -> Result<()> {
        self.geometry().validate()?;

        if self.nr_devs == 0 {
            return Err(ScullError::Config("nr_devs must be greater than 0".to_string()));
        }
        if self.first_minor.checked_add(self.nr_devs).is_none() {
            return Err(ScullError::Config(format!(
                "minor range overflows: first_minor={} nr_devs={}",
                self.first_minor, self.nr_devs
            )));
        }
        if self.worker_threads == 0 {
            return Err(ScullError::Config(
                "worker_threads must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the default quantum size (in bytes)
    pub fn quantum(mut self, quantum: usize) -> Self {
        self.config.quantum = quantum;
        self
    }

    /// Set the default quantum set width
    pub fn qset(mut self, qset: usize) -> Self {
        self.config.qset = qset;
        self
    }

    /// Set both geometry defaults at once
    pub fn geometry(mut self, geometry: Geometry) -> Self {
        self.config.quantum = geometry.quantum;
        self.config.qset = geometry.qset;
        self
    }

    /// Set the number of devices
    pub fn nr_devs(mut self, count: u32) -> Self {
        self.config.nr_devs = count;
        self
    }

    /// Set the first minor number
    pub fn first_minor(mut self, minor: u32) -> Self {
        self.config.first_minor = minor;
        self
    }

    /// Set the lock wait poll interval (in milliseconds)
    pub fn lock_poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.lock_poll_interval_ms = ms;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of connection workers
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the maximum number of queued connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
