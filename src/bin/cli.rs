//! scull CLI Client
//!
//! Command-line interface for reading and writing remote scull devices.

use std::io::Write;

use clap::{Parser, Subcommand};
use scull::network::Client;
use scull::{AccessMode, Result};

/// scull CLI
#[derive(Parser, Debug)]
#[command(name = "scull-cli")]
#[command(about = "CLI for scull devices")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7070")]
    server: String,

    /// Device minor number
    #[arg(short, long, default_value = "0")]
    minor: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ping the server
    Ping,

    /// Show size and geometry of the device
    Stat,

    /// Write data to the device
    Write {
        /// The data to write
        data: String,

        /// Offset to start writing at
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Open write-only, truncating the device first
        #[arg(short, long)]
        truncate: bool,
    },

    /// Read data from the device and print it to stdout
    Read {
        /// Offset to start reading at
        #[arg(short, long, default_value = "0")]
        offset: u64,

        /// Maximum number of bytes to read
        #[arg(short, long, default_value = "4096")]
        count: u64,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut client = Client::connect(&args.server)?;

    match args.command {
        Commands::Ping => {
            client.ping()?;
            println!("PONG");
        }
        Commands::Stat => {
            client.open(args.minor, AccessMode::ReadOnly)?;
            let stats = client.stat()?;
            println!("size:    {}", stats.size);
            println!("quantum: {}", stats.geometry.quantum);
            println!("qset:    {}", stats.geometry.qset);
            println!("qsets:   {}", stats.qsets);
            println!("quanta:  {}", stats.quanta);
        }
        Commands::Write {
            data,
            offset,
            truncate,
        } => {
            let mode = if truncate {
                AccessMode::WriteOnly
            } else {
                AccessMode::ReadWrite
            };
            client.open(args.minor, mode)?;
            let end = client.write_all(offset, data.as_bytes())?;
            println!("wrote {} bytes, end offset {}", data.len(), end);
        }
        Commands::Read { offset, count } => {
            client.open(args.minor, AccessMode::ReadOnly)?;

            // One quantum per request; an empty reply is end of store or a hole
            let mut pos = offset;
            let end = offset.saturating_add(count);
            let mut stdout = std::io::stdout().lock();
            while pos < end {
                let want = (end - pos).min(u32::MAX as u64) as u32;
                let chunk = client.read(pos, want)?;
                if chunk.is_empty() {
                    break;
                }
                stdout.write_all(&chunk)?;
                pos += chunk.len() as u64;
            }
            stdout.flush()?;
        }
    }

    Ok(())
}
