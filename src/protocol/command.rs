//! Command definitions
//!
//! Represents requests from clients.

use crate::driver::AccessMode;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Open = 0x01,
    Read = 0x02,
    Write = 0x03,
    Stat = 0x04,
    Ping = 0x05,
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open a device for this connection (write-only truncates it)
    Open { minor: u32, mode: AccessMode },

    /// Read at most `count` bytes at `offset` from the open device
    Read { offset: u64, count: u32 },

    /// Write `data` at `offset` to the open device
    Write { offset: u64, data: Vec<u8> },

    /// Report size and geometry of the open device
    Stat,

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Open { .. } => CommandType::Open,
            Command::Read { .. } => CommandType::Read,
            Command::Write { .. } => CommandType::Write,
            Command::Stat => CommandType::Stat,
            Command::Ping => CommandType::Ping,
        }
    }
}
