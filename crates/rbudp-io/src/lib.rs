#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `rbudp_io` is the interface boundary between the RBUDP state machines and
//! the operating system: memory-mapped file regions and the control/data
//! socket endpoints. Nothing in this crate knows about packet framing,
//! bitmaps, or handshakes — that belongs to `rbudp-proto`.
//!
//! # Design
//!
//! - [`file_region::FileRegion`] is a fixed-size, offset-addressable byte
//!   region; [`file_region::MmapFileRegion`] backs it with `memmap2`.
//! - [`socket::ControlChannel`] is an exact-length, blocking, ordered byte
//!   stream; [`socket::StdControlChannel`] backs it with `std::net::TcpStream`.
//! - [`socket::DataChannel`] is an unreliable, unordered datagram endpoint
//!   whose readiness is synthesized from a non-blocking receive rather than
//!   a separate poll primitive — a would-block result means "no datagram
//!   ready", per the receiver's drain loop.
//!
//! # Errors
//!
//! All fallible operations return [`rbudp_core::RbudpError`], tagging the
//! stage at which the failure occurred.

/// Fixed-size, offset-addressable file region backing sender/receiver I/O.
pub mod file_region;

/// Control-channel (TCP) and data-channel (UDP) socket adapters.
pub mod socket;

pub use file_region::{FileRegion, MmapFileRegion, OpenMode};
pub use socket::{ControlChannel, DataChannel, StdControlChannel, StdDataChannel};
