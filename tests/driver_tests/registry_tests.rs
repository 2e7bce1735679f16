//! Tests for the device layer
//!
//! These tests verify:
//! - Access mode decoding
//! - Device numbering and lookup
//! - Truncate-on-write-only-open policy
//! - OpenFile position tracking
//! - Shutdown interrupting blocked callers

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use scull::config::{Config, Geometry};
use scull::driver::{self, AccessMode, DeviceRegistry, O_RDONLY, O_RDWR, O_WRONLY};
use scull::store::{CancelToken, Store, UserBuf};
use scull::{Result, ScullError};

// =============================================================================
// Helper Functions
// =============================================================================

fn small_config(nr_devs: u32) -> Config {
    Config::builder()
        .quantum(4)
        .qset(2)
        .nr_devs(nr_devs)
        .lock_poll_interval_ms(5)
        .build()
}

/// Caller buffer that holds the store lock until told to continue
struct HoldingBuf {
    entered: mpsc::Sender<()>,
    release: std::sync::Mutex<mpsc::Receiver<()>>,
}

impl UserBuf for HoldingBuf {
    fn len(&self) -> usize {
        1
    }

    fn copy_from_user(&self, dst: &mut [u8]) -> Result<()> {
        self.entered.send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        dst.fill(b'h');
        Ok(())
    }
}

// =============================================================================
// Access Mode Tests
// =============================================================================

#[test]
fn test_access_mode_from_flags() {
    assert_eq!(AccessMode::from_flags(O_RDONLY).unwrap(), AccessMode::ReadOnly);
    assert_eq!(AccessMode::from_flags(O_WRONLY).unwrap(), AccessMode::WriteOnly);
    assert_eq!(AccessMode::from_flags(O_RDWR).unwrap(), AccessMode::ReadWrite);
}

#[test]
fn test_access_mode_ignores_other_flag_bits() {
    // O_CREAT | O_TRUNC | O_WRONLY
    let flags = 0o100 | 0o1000 | O_WRONLY;
    assert_eq!(AccessMode::from_flags(flags).unwrap(), AccessMode::WriteOnly);
}

#[test]
fn test_access_mode_invalid() {
    assert!(matches!(AccessMode::from_flags(3), Err(ScullError::Config(_))));
}

// =============================================================================
// Open Policy Tests
// =============================================================================

#[test]
fn test_open_policy_on_bare_store() {
    let store = Store::new(Geometry::new(4, 2).unwrap()).unwrap();
    let cancel = CancelToken::new();
    let mut pos = 0;
    store.write(&mut pos, &b"abc"[..], &cancel).unwrap();

    driver::open(&store, AccessMode::ReadOnly);
    assert_eq!(store.size(), 3);

    driver::open(&store, AccessMode::ReadWrite);
    assert_eq!(store.size(), 3);

    driver::open(&store, AccessMode::WriteOnly);
    assert_eq!(store.size(), 0);
}

#[test]
fn test_write_only_open_truncates_device() {
    let registry = DeviceRegistry::new(&small_config(1)).unwrap();

    let mut file = registry.open(0, AccessMode::ReadWrite).unwrap();
    file.write_all(b"hello").unwrap();

    let mut reader = registry.open(0, AccessMode::ReadOnly).unwrap();
    let mut buf = [0u8; 4];
    assert_eq!(reader.read(&mut buf).unwrap(), 4);
    assert_eq!(&buf, b"hell");

    registry.open(0, AccessMode::WriteOnly).unwrap();
    assert_eq!(registry.device(0).unwrap().size(), 0);

    let mut reader = registry.open(0, AccessMode::ReadOnly).unwrap();
    assert_eq!(reader.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_write_only_open_restores_geometry() {
    let registry = DeviceRegistry::new(&small_config(1)).unwrap();
    let store = registry.device(0).unwrap();

    store
        .reconfigure(Geometry::new(16, 16).unwrap(), &CancelToken::new())
        .unwrap();
    registry
        .open(0, AccessMode::ReadWrite)
        .unwrap()
        .write_all(b"data")
        .unwrap();

    registry.open(0, AccessMode::WriteOnly).unwrap();
    assert_eq!(store.geometry(), Geometry::new(4, 2).unwrap());
}

// =============================================================================
// OpenFile Tests
// =============================================================================

#[test]
fn test_open_file_tracks_position() {
    let registry = DeviceRegistry::new(&small_config(1)).unwrap();
    let mut file = registry.open(0, AccessMode::ReadWrite).unwrap();

    assert_eq!(file.pos(), 0);
    assert_eq!(file.write(b"0123456789").unwrap(), 4);
    assert_eq!(file.pos(), 4);

    file.write_all(b"456789").unwrap();
    assert_eq!(file.pos(), 10);

    let mut buf = [0u8; 10];
    assert_eq!(file.read_at(0, &mut buf).unwrap(), 4);
    assert_eq!(file.pos(), 4);
    assert_eq!(file.read(&mut buf[4..]).unwrap(), 4);
    assert_eq!(&buf[..8], b"01234567");

    file.set_pos(9);
    assert_eq!(file.read(&mut buf).unwrap(), 1);
    assert_eq!(buf[0], b'9');
    assert_eq!(file.read(&mut buf).unwrap(), 0);
}

#[test]
fn test_open_file_write_at() {
    let registry = DeviceRegistry::new(&small_config(1)).unwrap();
    let mut file = registry.open(0, AccessMode::ReadWrite).unwrap();

    assert_eq!(file.write_at(6, b"zz").unwrap(), 2);
    assert_eq!(file.pos(), 8);
    assert_eq!(file.store().size(), 8);
    assert_eq!(file.minor(), 0);
    assert_eq!(file.mode(), AccessMode::ReadWrite);
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_registry_numbers_devices_from_first_minor() {
    let config = Config::builder().nr_devs(3).first_minor(4).build();
    let registry = DeviceRegistry::new(&config).unwrap();

    assert_eq!(registry.len(), 3);
    assert_eq!(registry.minors(), 4..7);
    assert!(registry.device(3).is_none());
    assert!(registry.device(4).is_some());
    assert!(registry.device(6).is_some());
    assert!(registry.device(7).is_none());
}

#[test]
fn test_open_unknown_minor() {
    let registry = DeviceRegistry::new(&small_config(2)).unwrap();

    let result = registry.open(9, AccessMode::ReadOnly);
    assert!(matches!(result, Err(ScullError::NoDevice(9))));
}

#[test]
fn test_devices_are_independent() {
    let registry = DeviceRegistry::new(&small_config(2)).unwrap();

    registry
        .open(0, AccessMode::ReadWrite)
        .unwrap()
        .write_all(b"zero")
        .unwrap();
    registry
        .open(1, AccessMode::ReadWrite)
        .unwrap()
        .write_all(b"one")
        .unwrap();

    registry.open(1, AccessMode::WriteOnly).unwrap();

    assert_eq!(registry.device(0).unwrap().size(), 4);
    assert_eq!(registry.device(1).unwrap().size(), 0);
}

#[test]
fn test_registry_uses_config_geometry() {
    let registry = DeviceRegistry::new(&small_config(1)).unwrap();
    let store = registry.device(0).unwrap();

    assert_eq!(store.defaults(), Geometry::new(4, 2).unwrap());
    assert_eq!(store.geometry(), Geometry::new(4, 2).unwrap());
}

#[test]
fn test_registry_rejects_invalid_config() {
    let no_devices = Config::builder().nr_devs(0).build();
    assert!(matches!(DeviceRegistry::new(&no_devices), Err(ScullError::Config(_))));

    let no_quantum = Config::builder().quantum(0).build();
    assert!(matches!(DeviceRegistry::new(&no_quantum), Err(ScullError::Config(_))));

    let overflow = Config::builder().first_minor(u32::MAX).nr_devs(2).build();
    assert!(matches!(DeviceRegistry::new(&overflow), Err(ScullError::Config(_))));
}

#[test]
fn test_shutdown_interrupts_blocked_callers() {
    let registry = Arc::new(DeviceRegistry::new(&small_config(1)).unwrap());
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let buf = HoldingBuf {
        entered: entered_tx,
        release: std::sync::Mutex::new(release_rx),
    };

    let holder = {
        let store = Arc::clone(registry.device(0).unwrap());
        thread::spawn(move || {
            let mut pos = 0;
            store.write(&mut pos, &buf, &CancelToken::new())
        })
    };
    entered_rx.recv().unwrap();

    let mut file = registry.open(0, AccessMode::ReadOnly).unwrap();
    let waiter = thread::spawn(move || {
        let mut buf = [0u8; 1];
        file.read(&mut buf)
    });

    thread::sleep(Duration::from_millis(30));
    registry.shutdown();
    assert!(registry.is_shutdown());

    assert!(matches!(waiter.join().unwrap(), Err(ScullError::Interrupted)));

    release_tx.send(()).unwrap();
    assert_eq!(holder.join().unwrap().unwrap(), 1);
}
