//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! - OPEN:  minor (4 bytes) + mode (1 byte)
//! - READ:  offset (8 bytes) + count (4 bytes)
//! - WRITE: offset (8 bytes) + data
//! - STAT:  empty
//! - PING:  empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! All integers are big-endian.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::driver::AccessMode;
use crate::error::{Result, ScullError};
use super::{Command, Response, Status};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
pub fn encode_command(command: &Command) -> Vec<u8> {
    let mut payload = BytesMut::new();

    match command {
        Command::Open { minor, mode } => {
            payload.put_u32(*minor);
            payload.put_u8(*mode as u8);
        }
        Command::Read { offset, count } => {
            payload.put_u64(*offset);
            payload.put_u32(*count);
        }
        Command::Write { offset, data } => {
            payload.reserve(8 + data.len());
            payload.put_u64(*offset);
            payload.put_slice(data);
        }
        Command::Stat | Command::Ping => {}
    }

    frame(command.command_type() as u8, &payload)
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    let (cmd_type, payload) = split_frame(bytes, "command")?;

    match cmd_type {
        0x01 => decode_open_command(payload),
        0x02 => decode_read_command(payload),
        0x03 => decode_write_command(payload),
        0x04 => decode_empty_command(payload, "STAT", Command::Stat),
        0x05 => decode_empty_command(payload, "PING", Command::Ping),
        _ => Err(ScullError::Protocol(format!(
            "Unknown command type: 0x{:02x}",
            cmd_type
        ))),
    }
}

/// Decode OPEN command payload
fn decode_open_command(payload: &[u8]) -> Result<Command> {
    if payload.len() != 5 {
        return Err(ScullError::Protocol(format!(
            "OPEN command: expected 5 bytes, got {}",
            payload.len()
        )));
    }

    let mut buf = payload;
    let minor = buf.get_u32();
    let mode = match buf.get_u8() {
        0 => AccessMode::ReadOnly,
        1 => AccessMode::WriteOnly,
        2 => AccessMode::ReadWrite,
        other => {
            return Err(ScullError::Protocol(format!(
                "OPEN command: invalid access mode {}",
                other
            )))
        }
    };

    Ok(Command::Open { minor, mode })
}

/// Decode READ command payload
fn decode_read_command(payload: &[u8]) -> Result<Command> {
    if payload.len() != 12 {
        return Err(ScullError::Protocol(format!(
            "READ command: expected 12 bytes, got {}",
            payload.len()
        )));
    }

    let mut buf = payload;
    let offset = buf.get_u64();
    let count = buf.get_u32();

    Ok(Command::Read { offset, count })
}

/// Decode WRITE command payload
fn decode_write_command(payload: &[u8]) -> Result<Command> {
    if payload.len() < 8 {
        return Err(ScullError::Protocol(
            "WRITE command: missing offset".to_string(),
        ));
    }

    let mut buf = payload;
    let offset = buf.get_u64();
    let data = buf.to_vec();

    Ok(Command::Write { offset, data })
}

/// Decode a command that carries no payload
fn decode_empty_command(payload: &[u8], name: &str, command: Command) -> Result<Command> {
    if !payload.is_empty() {
        return Err(ScullError::Protocol(format!(
            "{} command: unexpected payload of {} bytes",
            name,
            payload.len()
        )));
    }
    Ok(command)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Vec<u8> {
    frame(response.status as u8, response.payload())
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (status_byte, payload) = split_frame(bytes, "response")?;

    let status = match status_byte {
        0x00 => Status::Ok,
        0x01 => Status::Interrupted,
        0x02 => Status::Error,
        _ => {
            return Err(ScullError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                status_byte
            )))
        }
    };

    let payload = if payload.is_empty() {
        None
    } else {
        Some(payload.to_vec())
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Framing
// =============================================================================

fn frame(kind: u8, payload: &[u8]) -> Vec<u8> {
    let mut message = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    message.put_u8(kind);
    message.put_u32(payload.len() as u32);
    message.put_slice(payload);
    message.to_vec()
}

/// Split a complete message into its kind byte and payload
fn split_frame<'a>(bytes: &'a [u8], what: &str) -> Result<(u8, &'a [u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(ScullError::Protocol(format!(
            "Incomplete {} header: expected {} bytes, got {}",
            what,
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let kind = header.get_u8();
    let payload_len = check_payload_len(header.get_u32(), what)?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(ScullError::Protocol(format!(
            "Incomplete {} payload: expected {} bytes, got {}",
            what,
            total_len,
            bytes.len()
        )));
    }

    Ok((kind, &bytes[HEADER_SIZE..total_len]))
}

fn check_payload_len(len: u32, what: &str) -> Result<usize> {
    if len > MAX_PAYLOAD_SIZE {
        return Err(ScullError::Protocol(format!(
            "{} payload too large: {} bytes (max {})",
            what, len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(len as usize)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame (header + payload) from a stream
fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let mut len_bytes = &header[1..];
    let payload_len = check_payload_len(len_bytes.get_u32(), what)?;

    let mut message = vec![0u8; HEADER_SIZE + payload_len];
    message[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut message[HEADER_SIZE..])?;
    }

    Ok(message)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let message = read_frame(reader, "command")?;
    decode_command(&message)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let message = read_frame(reader, "response")?;
    decode_response(&message)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
