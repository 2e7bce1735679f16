//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept loop)
//! - Worker thread pool for connections, fed by a bounded channel
//! - One open device per connection, routed through the DeviceRegistry

mod client;
mod connection;
mod server;

pub use client::Client;
pub use connection::Connection;
pub use server::{Server, ShutdownHandle};
