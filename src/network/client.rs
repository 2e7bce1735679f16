//! Blocking client for the scull server

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::driver::AccessMode;
use crate::error::{Result, ScullError};
use crate::protocol::{
    parse_stat, parse_written, read_response, write_command, Command, Response, Status,
};
use crate::store::StoreStats;

/// One connection to a scull server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| ScullError::Network(format!("connect failed: {}", e)))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: BufWriter::new(stream),
        })
    }

    pub fn ping(&mut self) -> Result<()> {
        let response = self.call(&Command::Ping)?;
        if response.payload() != b"PONG" {
            return Err(ScullError::Protocol(format!(
                "unexpected PING reply: {:?}",
                response.message()
            )));
        }
        Ok(())
    }

    /// Open device `minor`; write-only truncates it
    pub fn open(&mut self, minor: u32, mode: AccessMode) -> Result<()> {
        self.call(&Command::Open { minor, mode })?;
        Ok(())
    }

    /// Read at most `count` bytes at `offset`
    ///
    /// Same rules as a local read: never crosses a quantum, empty at end of
    /// store and inside holes.
    pub fn read(&mut self, offset: u64, count: u32) -> Result<Vec<u8>> {
        let response = self.call(&Command::Read { offset, count })?;
        Ok(response.payload.unwrap_or_default())
    }

    /// Write `data` at `offset`, returning how much the device accepted
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<usize> {
        let response = self.call(&Command::Write {
            offset,
            data: data.to_vec(),
        })?;
        parse_written(response.payload())
    }

    /// Write all of `data` starting at `offset`; returns the end offset
    pub fn write_all(&mut self, mut offset: u64, mut data: &[u8]) -> Result<u64> {
        while !data.is_empty() {
            let written = self.write(offset, data)?;
            if written == 0 {
                return Err(ScullError::Protocol("device accepted 0 bytes".to_string()));
            }
            offset += written as u64;
            data = &data[written..];
        }
        Ok(offset)
    }

    pub fn stat(&mut self) -> Result<StoreStats> {
        let response = self.call(&Command::Stat)?;
        parse_stat(response.payload())
    }

    /// Send one command and wait for its OK response
    ///
    /// INTERRUPTED maps to [`ScullError::Interrupted`]. Every ERROR reply,
    /// whatever the server-side cause (unknown minor, fault, allocation
    /// failure), comes back as [`ScullError::Network`] carrying the server's
    /// message.
    fn call(&mut self, command: &Command) -> Result<Response> {
        write_command(&mut self.writer, command)?;
        let response = read_response(&mut self.reader)?;

        match response.status {
            Status::Ok => Ok(response),
            Status::Interrupted => Err(ScullError::Interrupted),
            Status::Error => Err(ScullError::Network(response.message())),
        }
    }
}
