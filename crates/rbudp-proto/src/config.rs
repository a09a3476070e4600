//! Sender- and receiver-facing configuration.
//!
//! Validation happens once, at construction, rather than deep inside the
//! transfer loop — an oversized block size or destination path is rejected
//! before any connection is attempted (scenario S6).

use std::path::PathBuf;

use rbudp_core::descriptor::{validate_block_size, validate_path_len};
use rbudp_core::{DEFAULT_BLOCK_SIZE, RbudpError};

/// Configuration for the sending side of a transfer.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Path to the local file to transmit.
    pub source_path: PathBuf,
    /// Destination path sent to the receiver in the handshake.
    pub destination_path: String,
    /// Receiver host, resolved for both the control and data channel.
    pub host: String,
    /// Port shared by the control and data channel.
    pub port: u16,
    /// Block size in bytes; power of two, `<= MAX_BLOCK_SIZE`.
    pub block_size: u32,
}

impl SenderConfig {
    /// Builds a config, applying [`DEFAULT_BLOCK_SIZE`] when `block_size` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::ProtocolViolation`] if `block_size` is not a
    /// valid power of two within bounds, or if `destination_path` does not
    /// fit the wire's fixed-size field.
    pub fn new(
        source_path: PathBuf,
        destination_path: String,
        host: String,
        port: u16,
        block_size: Option<u32>,
    ) -> Result<Self, RbudpError> {
        let block_size = block_size.unwrap_or(DEFAULT_BLOCK_SIZE);
        validate_block_size(block_size)?;
        validate_path_len(&destination_path)?;

        Ok(Self {
            source_path,
            destination_path,
            host,
            port,
            block_size,
        })
    }
}

/// Configuration for the receiving side of a transfer.
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// Interface to bind the control and data channel listeners on.
    pub bind_host: String,
    /// Port shared by the control and data channel.
    pub port: u16,
}

impl ReceiverConfig {
    /// Builds a config. The receiver learns `block_size` and the destination
    /// path from the handshake, so there is nothing else to validate here.
    #[must_use]
    pub fn new(bind_host: String, port: u16) -> Self {
        Self { bind_host, port }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_config_defaults_block_size() {
        let config = SenderConfig::new(
            PathBuf::from("/tmp/src.bin"),
            "/tmp/dest.bin".to_owned(),
            "127.0.0.1".to_owned(),
            9000,
            None,
        )
        .unwrap();
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
    }

    #[test]
    fn sender_config_rejects_non_power_of_two_block_size() {
        let result = SenderConfig::new(
            PathBuf::from("/tmp/src.bin"),
            "/tmp/dest.bin".to_owned(),
            "127.0.0.1".to_owned(),
            9000,
            Some(100),
        );
        assert!(result.is_err());
    }

    #[test]
    fn sender_config_rejects_oversized_destination_path() {
        // S6: destination path of 2049 non-null bytes, rejected pre-send.
        let oversized = "a".repeat(2049);
        let result = SenderConfig::new(
            PathBuf::from("/tmp/src.bin"),
            oversized,
            "127.0.0.1".to_owned(),
            9000,
            None,
        );
        assert!(result.is_err());
    }
}
