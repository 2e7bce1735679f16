//! Response definitions
//!
//! Represents responses to clients, plus the fixed payload layouts of the
//! WRITE and STAT replies.

use bytes::{Buf, BufMut};

use crate::config::Geometry;
use crate::error::{Result, ScullError};
use crate::store::StoreStats;

/// STAT payload: size(8) + quantum(4) + qset(4) + qsets(8) + quanta(8)
pub const STAT_PAYLOAD_SIZE: usize = 32;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    Interrupted = 0x01,
    Error = 0x02,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Optional payload (data for READ, count for WRITE, message for ERROR)
    pub payload: Option<Vec<u8>>,
}

impl Response {
    /// Create an OK response with optional payload
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    /// Create an INTERRUPTED response (client should retry)
    pub fn interrupted() -> Self {
        Self {
            status: Status::Interrupted,
            payload: None,
        }
    }

    /// Create an ERROR response
    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Map a store/driver error onto the wire
    pub fn from_error(error: &ScullError) -> Self {
        match error {
            ScullError::Interrupted => Self::interrupted(),
            other => Self::error(&other.to_string()),
        }
    }

    /// OK reply to a WRITE carrying the count written
    pub fn written(count: usize) -> Self {
        Self::ok(Some((count as u32).to_be_bytes().to_vec()))
    }

    /// OK reply to a STAT
    ///
    /// Fails if the geometry does not fit the 32-bit wire fields.
    pub fn stat(stats: &StoreStats) -> Result<Self> {
        let mut payload = Vec::with_capacity(STAT_PAYLOAD_SIZE);
        payload.put_u64(stats.size);
        payload.put_u32(wire_u32("quantum", stats.geometry.quantum)?);
        payload.put_u32(wire_u32("qset", stats.geometry.qset)?);
        payload.put_u64(stats.qsets as u64);
        payload.put_u64(stats.quanta as u64);
        Ok(Self::ok(Some(payload)))
    }

    /// Payload bytes, empty if none
    pub fn payload(&self) -> &[u8] {
        self.payload.as_deref().unwrap_or(&[])
    }

    /// Error message carried by an ERROR response
    pub fn message(&self) -> String {
        String::from_utf8_lossy(self.payload()).into_owned()
    }
}

fn wire_u32(field: &str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| {
        ScullError::Protocol(format!("STAT reply: {} {} does not fit in 32 bits", field, value))
    })
}

/// Parse the count out of a WRITE reply payload
pub fn parse_written(payload: &[u8]) -> Result<usize> {
    if payload.len() != 4 {
        return Err(ScullError::Protocol(format!(
            "WRITE reply: expected 4 bytes, got {}",
            payload.len()
        )));
    }
    let mut buf = payload;
    Ok(buf.get_u32() as usize)
}

/// Parse a STAT reply payload
pub fn parse_stat(payload: &[u8]) -> Result<StoreStats> {
    if payload.len() != STAT_PAYLOAD_SIZE {
        return Err(ScullError::Protocol(format!(
            "STAT reply: expected {} bytes, got {}",
            STAT_PAYLOAD_SIZE,
            payload.len()
        )));
    }

    let mut buf = payload;
    let size = buf.get_u64();
    let quantum = buf.get_u32() as usize;
    let qset = buf.get_u32() as usize;
    let qsets = buf.get_u64() as usize;
    let quanta = buf.get_u64() as usize;

    Ok(StoreStats {
        size,
        geometry: Geometry { quantum, qset },
        qsets,
        quanta,
    })
}
