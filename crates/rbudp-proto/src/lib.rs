#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Sender and receiver state machines for the RBUDP file-blast protocol,
//! built only against the [`rbudp_io`] traits: [`rbudp_io::ControlChannel`],
//! [`rbudp_io::DataChannel`], and [`rbudp_io::FileRegion`]. Neither state
//! machine knows it is talking to real sockets or a memory-mapped file.
//!
//! # Design
//!
//! [`sender::Sender::run`] drives `CONNECTING → HANDSHAKE_SENT → BLASTING →
//! DRAINING → (DONE | FAILED)`. [`receiver::Receiver::run`] drives
//! `LISTENING → ACCEPTED → HANDSHAKE_RECEIVED → TRANSFERRING → (DONE |
//! FAILED)`. Both are documented in full on their respective modules.
//!
//! # Invariants
//!
//! - Every fallible step returns [`rbudp_core::RbudpError`]; there is no
//!   retry at this layer.
//! - The sender never enters `DRAINING` while any bit of its local
//!   acknowledgement bitmap is unset.
//! - The receiver never writes outside `[0, number_packets * block_size)`
//!   of its mapped file region.

/// Sender- and receiver-facing configuration, validated at construction time.
pub mod config;

/// Receiver state machine.
pub mod receiver;

/// Sender state machine.
pub mod sender;

pub use config::{ReceiverConfig, SenderConfig};
pub use receiver::Receiver;
pub use sender::Sender;
