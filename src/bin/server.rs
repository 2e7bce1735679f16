//! scull Server Binary
//!
//! Creates the scull devices and serves them over TCP. Ctrl+C shuts the
//! server down gracefully.

use std::sync::Arc;

use clap::Parser;
use scull::config::{DEFAULT_QSET, DEFAULT_QUANTUM};
use scull::network::Server;
use scull::{Config, DeviceRegistry};
use tracing_subscriber::{fmt, EnvFilter};

/// scull Server
#[derive(Parser, Debug)]
#[command(name = "scull-server")]
#[command(about = "Sparse in-memory character devices served over TCP")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    listen: String,

    /// Number of devices
    #[arg(short = 'n', long, default_value = "1")]
    devices: u32,

    /// Minor number of the first device
    #[arg(long, default_value = "0")]
    first_minor: u32,

    /// Default quantum size in bytes
    #[arg(short, long, default_value_t = DEFAULT_QUANTUM)]
    quantum: usize,

    /// Default number of quanta per quantum set
    #[arg(short = 's', long, default_value_t = DEFAULT_QSET)]
    qset: usize,

    /// Connection worker threads
    #[arg(short, long, default_value = "4")]
    workers: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,scull=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("scull server v{}", scull::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .nr_devs(args.devices)
        .first_minor(args.first_minor)
        .quantum(args.quantum)
        .qset(args.qset)
        .worker_threads(args.workers)
        .build();

    let registry = match DeviceRegistry::new(&config) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            tracing::error!("Failed to create devices: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config, registry) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.shutdown();
    }) {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
