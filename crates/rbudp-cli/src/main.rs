#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `rbudp` is the command-line front-end for the RBUDP file-blast protocol:
//! a `send` subcommand that blasts a local file to a peer and a `recv`
//! subcommand that listens for one incoming transfer.
//!
//! # Design
//!
//! Argument parsing is a thin `clap` derive layer over
//! [`rbudp_proto::SenderConfig`]/[`rbudp_proto::ReceiverConfig`]; the binary's
//! only job beyond parsing is initializing the `tracing` subscriber from the
//! repeated `-v` count and mapping the returned [`rbudp_core::RbudpError`] to
//! a process exit code.
//!
//! # Errors
//!
//! `main` never panics on a protocol failure: every [`rbudp_core::RbudpError`]
//! is caught, printed to stderr via its `Display` impl, and translated to a
//! distinct non-zero exit code via [`exit_code_for`].

use std::net::ToSocketAddrs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rbudp_core::RbudpError;
use rbudp_logging::VerbosityConfig;
use rbudp_proto::{Receiver, ReceiverConfig, Sender, SenderConfig};

/// Command-line entry point for the RBUDP file-blast protocol.
#[derive(Debug, Parser)]
#[command(name = "rbudp", version, about)]
struct Cli {
    /// Increase log verbosity. Repeat for more detail (`-v`, `-vv`, `-vvv`).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Blast a local file to a listening receiver.
    Send {
        /// Path to the local file to transmit.
        #[arg(long)]
        file: PathBuf,
        /// Receiver address, as `host:port`.
        #[arg(long = "to")]
        to: String,
        /// Destination path the receiver should write to.
        #[arg(long)]
        dest: String,
        /// Block size in bytes. Must be a power of two, at most 65532. Defaults to 4096.
        #[arg(long = "block-size")]
        block_size: Option<u32>,
    },
    /// Listen for one incoming transfer.
    Recv {
        /// Address to listen on, as `host:port`.
        #[arg(long)]
        listen: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    rbudp_logging::init(VerbosityConfig::from_verbose_count(cli.verbose));

    let result = match cli.command {
        Command::Send {
            file,
            to,
            dest,
            block_size,
        } => run_send(file, &to, dest, block_size),
        Command::Recv { listen } => run_recv(&listen),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("rbudp: {error}");
            ExitCode::from(exit_code_for(&error))
        }
    }
}

fn run_send(file: PathBuf, to: &str, dest: String, block_size: Option<u32>) -> Result<(), RbudpError> {
    let (host, port) = split_host_port(to)?;
    let config = SenderConfig::new(file, dest, host, port, block_size)?;
    Sender::connect_and_run(&config)
}

fn run_recv(listen: &str) -> Result<(), RbudpError> {
    let (host, port) = split_host_port(listen)?;
    let config = ReceiverConfig::new(host, port);
    Receiver::accept_and_run(&config)
}

/// Splits a `host:port` address, resolving it once up front so a bad address
/// is rejected before any socket is touched (mirroring the pre-send
/// validation in [`SenderConfig::new`]).
fn split_host_port(address: impl Into<String>) -> Result<(String, u16), RbudpError> {
    let address = address.into();
    let resolved = address
        .to_socket_addrs()
        .map_err(|source| RbudpError::Connect {
            stage: "parse address",
            source,
        })?
        .next()
        .ok_or_else(|| RbudpError::Connect {
            stage: "parse address",
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("could not resolve {address}")),
        })?;

    let host = address.rsplit_once(':').map_or(address.clone(), |(host, _)| host.to_owned());
    Ok((host, resolved.port()))
}

/// Maps a session failure onto a distinct process exit code, by stage.
const fn exit_code_for(error: &RbudpError) -> u8 {
    match error {
        RbudpError::Connect { .. } => 2,
        RbudpError::ControlIo { .. } => 3,
        RbudpError::DataIo { .. } => 4,
        RbudpError::ProtocolViolation { .. } => 5,
        RbudpError::ResourceAcquisition { .. } => 6,
        RbudpError::BitmapOutOfRange { .. } => 7,
    }
}
