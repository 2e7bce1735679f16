//! Protocol Module
//!
//! Defines the wire protocol for remote access to scull devices.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: OPEN  - Payload: minor (4) + mode (1)
//! - 0x02: READ  - Payload: offset (8) + count (4)
//! - 0x03: WRITE - Payload: offset (8) + data
//! - 0x04: STAT  - Payload: empty
//! - 0x05: PING  - Payload: empty
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: INTERRUPTED (retry the request)
//! - 0x02: ERROR

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{parse_stat, parse_written, Response, Status, STAT_PAYLOAD_SIZE};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
