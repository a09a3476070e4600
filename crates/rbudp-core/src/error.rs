//! Error taxonomy shared by the protocol core, I/O adapters, and state machines.

use std::fmt;
use std::io;

/// Failure produced by any stage of an RBUDP session.
///
/// Every variant carries the `stage` at which it occurred (`"handshake"`,
/// `"data recv"`, `"bitmap send"`, ...) so a session-level failure can be
/// reported with a diagnostic identifying the offending stage, per the
/// protocol's error-handling design.
#[derive(Debug, thiserror::Error)]
pub enum RbudpError {
    /// Host resolution, bind, listen, accept, or connect failed.
    #[error("{stage}: connection failed: {source}")]
    Connect {
        /// Stage at which the failure occurred.
        stage: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A read or write on the control channel failed, reset, or hit EOF
    /// before the terminal flag.
    #[error("{stage}: control channel I/O failed: {source}")]
    ControlIo {
        /// Stage at which the failure occurred.
        stage: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A send or receive on the datagram channel failed.
    #[error("{stage}: data channel I/O failed: {source}")]
    DataIo {
        /// Stage at which the failure occurred.
        stage: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A packet, path, or block size violated a protocol bound.
    #[error("{stage}: protocol violation: {detail}")]
    ProtocolViolation {
        /// Stage at which the violation was detected.
        stage: &'static str,
        /// Human-readable description of the violation.
        detail: String,
    },

    /// A file region or mapped memory could not be acquired.
    #[error("{stage}: resource acquisition failed: {source}")]
    ResourceAcquisition {
        /// Stage at which the failure occurred.
        stage: &'static str,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },

    /// A bit-set operation was attempted with an out-of-range index.
    ///
    /// The protocol range-checks every packet id before it reaches the
    /// bitmap, so this indicates a programmer error rather than a
    /// reachable protocol state.
    #[error("bitmap index {index} out of range for capacity {capacity}")]
    BitmapOutOfRange {
        /// The offending index.
        index: u32,
        /// The bitmap's logical capacity.
        capacity: u32,
    },
}

impl RbudpError {
    /// Returns the stage this failure occurred at, for diagnostics.
    ///
    /// [`RbudpError::BitmapOutOfRange`] has no associated stage since it is a
    /// programmer error rather than a session-level failure; `"bitmap"` is
    /// returned for it instead.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Connect { stage, .. }
            | Self::ControlIo { stage, .. }
            | Self::DataIo { stage, .. }
            | Self::ProtocolViolation { stage, .. }
            | Self::ResourceAcquisition { stage, .. } => stage,
            Self::BitmapOutOfRange { .. } => "bitmap",
        }
    }
}

/// A result whose error is [`RbudpError`].
pub type RbudpResult<T> = Result<T, RbudpError>;

pub(crate) fn protocol_violation(stage: &'static str, detail: impl fmt::Display) -> RbudpError {
    RbudpError::ProtocolViolation {
        stage,
        detail: detail.to_string(),
    }
}
