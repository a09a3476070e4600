#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `rbudp_core` is the wire-protocol core of a Reliable Blast UDP (RBUDP)
//! file-blast transport: a bulk data mover that pushes file contents over an
//! unreliable datagram channel at line rate while a paired reliable stream
//! negotiates, confirms, and repairs the transfer.
//!
//! # Design
//!
//! The crate has no knowledge of sockets or files — that boundary belongs to
//! `rbudp-io`. It exposes three primitives:
//!
//! - [`packet`] encodes and decodes the 4-byte header + payload datagram frame.
//! - [`bitmap`] is the packed bit-set keyed by packet index that both peers
//!   use to track which packets have arrived.
//! - [`descriptor`] derives every size the protocol needs
//!   (`number_packets`, `packet_size`, `bitmap_size_bytes`,
//!   `max_packets_per_batch`) from `(file_size, block_size)`.
//!
//! [`error::RbudpError`] is the shared failure type both `rbudp-io` and
//! `rbudp-proto` propagate.
//!
//! # Invariants
//!
//! - Both peers agree on `(number_packets, block_size, packet_size,
//!   bitmap_size_bytes)` bit-for-bit once the handshake completes.
//! - A packet whose id is `>= number_packets` is always rejected before it
//!   touches any storage.
//! - The wire header is little-endian regardless of host architecture.

/// Shared error type propagated by the protocol core, I/O adapters, and state machines.
pub mod error;

/// Packed bit-set keyed by packet index.
pub mod bitmap;

/// The 4-byte header + payload datagram frame codec.
pub mod packet;

/// Derived sizes for a transmission, computed from `(file_size, block_size)`.
pub mod descriptor;

/// Fixed-size wire encoding of the handshake's destination-path field.
pub mod path;

pub use bitmap::Bitmap;
pub use descriptor::TransmissionDescriptor;
pub use error::RbudpError;
pub use packet::{PACKET_HEADER_SIZE, decode, encode};

/// Maximum size of a single datagram the data channel is assumed to carry.
///
/// Upstream RBUDP assumes a 65536-byte UDP MTU ceiling; `block_size` plus the
/// 4-byte header must never exceed it.
pub const MAX_DATAGRAM_SIZE: u32 = 65536;

/// Default block size used when the caller does not specify one.
pub const DEFAULT_BLOCK_SIZE: u32 = 4096;

/// Largest `block_size` the protocol accepts (`MAX_DATAGRAM_SIZE` minus the header).
pub const MAX_BLOCK_SIZE: u32 = MAX_DATAGRAM_SIZE - PACKET_HEADER_SIZE as u32;

/// Fixed wire size, in bytes, of the destination-path field in the handshake,
/// including its null terminator.
pub const PATH_FIELD_SIZE: usize = 2048;

/// Control-channel byte the receiver sends once the handshake is applied
/// ("ready, start transmission").
pub const READY_ACK: u8 = 0x01;

/// Control-channel flag meaning "batch done, poll the data channel then reply".
pub const FLAG_BATCH_DONE: u8 = 0x01;

/// Control-channel flag meaning "session complete, close".
pub const FLAG_SESSION_COMPLETE: u8 = 0x00;
