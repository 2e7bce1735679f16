//! TCP Server
//!
//! Accepts connections and dispatches them to a fixed pool of worker
//! threads over a bounded channel.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};
use parking_lot::Mutex;

use crate::config::Config;
use crate::driver::DeviceRegistry;
use crate::error::{Result, ScullError};
use crate::protocol::{write_response, Response};

use super::Connection;

/// Sleep between non-blocking accept attempts
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Stops a running [`Server`] from another thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Streams currently being served, so shutdown can unblock their workers
#[derive(Default)]
struct LiveConnections {
    streams: Mutex<HashMap<u64, TcpStream>>,
    next_id: AtomicU64,
}

impl LiveConnections {
    fn register(&self, stream: &TcpStream) -> std::io::Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.streams.lock().insert(id, stream.try_clone()?);
        Ok(id)
    }

    fn unregister(&self, id: u64) {
        self.streams.lock().remove(&id);
    }

    /// Shut down both halves of every live stream; blocked reads return EOF
    fn close_all(&self) {
        for (_, stream) in self.streams.lock().drain() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

/// TCP server exposing scull devices
pub struct Server {
    config: Config,
    registry: Arc<DeviceRegistry>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
    live: Arc<LiveConnections>,
}

impl Server {
    /// Bind the listen socket; no connections are accepted until `run`
    pub fn bind(config: Config, registry: Arc<DeviceRegistry>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            ScullError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            registry,
            listener,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
            live: Arc::new(LiveConnections::default()),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Start the server (blocking until shut down)
    ///
    /// On shutdown: stop accepting, interrupt every blocked device lock
    /// wait, close every live connection, then join the workers.
    pub fn run(&self) -> Result<()> {
        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_connections);

        let workers = (0..self.config.worker_threads)
            .map(|id| self.spawn_worker(id, rx.clone()))
            .collect::<std::io::Result<Vec<_>>>()?;
        drop(rx);

        tracing::info!(
            "Listening on {} with {} workers",
            self.local_addr()?,
            workers.len()
        );

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = stream.set_nonblocking(false) {
                        tracing::warn!("Dropping connection from {}: {}", addr, e);
                        continue;
                    }
                    match tx.try_send(stream) {
                        Ok(()) => tracing::trace!("Queued connection from {}", addr),
                        Err(TrySendError::Full(mut stream)) => {
                            tracing::warn!("Connection queue full, rejecting {}", addr);
                            let _ = write_response(&mut stream, &Response::error("server busy"));
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            tracing::error!("All workers exited, stopping accept loop");
                            break;
                        }
                    }
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                }
            }
        }

        tracing::info!("Shutting down server");
        // Connections check the registry after registering their stream, so
        // one registered after close_all still sees the shutdown and exits.
        self.registry.shutdown();
        self.live.close_all();
        drop(tx);

        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        Ok(())
    }

    fn spawn_worker(&self, id: usize, rx: Receiver<TcpStream>) -> std::io::Result<JoinHandle<()>> {
        let registry = Arc::clone(&self.registry);
        let live = Arc::clone(&self.live);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        thread::Builder::new()
            .name(format!("scull-worker-{}", id))
            .spawn(move || {
                for stream in rx.iter() {
                    if registry.is_shutdown() {
                        let _ = stream.shutdown(Shutdown::Both);
                        continue;
                    }
                    let id = match live.register(&stream) {
                        Ok(id) => id,
                        Err(e) => {
                            tracing::warn!("Failed to track connection: {}", e);
                            continue;
                        }
                    };
                    serve(stream, &registry, read_ms, write_ms);
                    live.unregister(id);
                }
            })
    }
}

fn serve(stream: TcpStream, registry: &Arc<DeviceRegistry>, read_ms: u64, write_ms: u64) {
    let mut connection = match Connection::new(stream, Arc::clone(registry)) {
        Ok(connection) => connection,
        Err(e) => {
            tracing::warn!("Failed to set up connection: {}", e);
            return;
        }
    };
    if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
        tracing::warn!("Failed to set timeouts for {}: {}", connection.peer_addr(), e);
        return;
    }
    if let Err(e) = connection.handle() {
        tracing::debug!("Connection {} closed with error: {}", connection.peer_addr(), e);
    }
}
