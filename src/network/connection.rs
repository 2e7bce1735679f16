//! Connection Handler
//!
//! Handles individual client connections. A connection behaves like a file
//! descriptor: it opens at most one device at a time and every READ/WRITE
//! goes to that device.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::driver::{DeviceRegistry, OpenFile};
use crate::error::{Result, ScullError};
use crate::protocol::{read_command, write_response, Command, Response, MAX_PAYLOAD_SIZE};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Devices served by this process
    registry: Arc<DeviceRegistry>,

    /// Device opened by the last OPEN, if any
    file: Option<OpenFile>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    pub fn new(stream: TcpStream, registry: Arc<DeviceRegistry>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            registry,
            file: None,
            peer_addr,
        })
    }

    /// Configure connection timeouts
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses. Returns when the client
    /// disconnects, goes idle past the read timeout, the registry is shut
    /// down, or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            if self.registry.is_shutdown() {
                tracing::debug!("Closing connection from {} for shutdown", self.peer_addr);
                return Ok(());
            }

            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(ScullError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(ScullError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    let _ = self.send_response(Response::error(&e.to_string()));
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            let response = self.execute_command(command);

            if let Err(e) = self.send_response(response) {
                if let ScullError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Execute a command and return a response
    fn execute_command(&mut self, command: Command) -> Response {
        match self.dispatch(command) {
            Ok(response) => response,
            Err(ScullError::Interrupted) => {
                tracing::debug!("Operation for {} interrupted", self.peer_addr);
                Response::interrupted()
            }
            Err(e) => Response::from_error(&e),
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<Response> {
        match command {
            Command::Ping => Ok(Response::ok(Some(b"PONG".to_vec()))),
            Command::Open { minor, mode } => {
                let file = self.registry.open(minor, mode)?;
                tracing::debug!("Client {} opened minor {} ({:?})", self.peer_addr, minor, mode);
                self.file = Some(file);
                Ok(Response::ok(None))
            }
            Command::Read { offset, count } => {
                let file = self.open_file()?;
                let mut buf = vec![0u8; count.min(MAX_PAYLOAD_SIZE) as usize];
                let read = file.read_at(offset, &mut buf)?;
                buf.truncate(read);
                Ok(Response::ok(Some(buf)))
            }
            Command::Write { offset, data } => {
                let file = self.open_file()?;
                let written = file.write_at(offset, &data)?;
                Ok(Response::written(written))
            }
            Command::Stat => {
                let file = self.open_file()?;
                Response::stat(&file.store().stats())
            }
        }
    }

    fn open_file(&mut self) -> Result<&mut OpenFile> {
        self.file
            .as_mut()
            .ok_or_else(|| ScullError::Protocol("no device open on this connection".to_string()))
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}
