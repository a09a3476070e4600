//! `TransmissionDescriptor`: every size the protocol needs, derived from
//! `(file_size, block_size, destination_path)`.

use crate::error::{RbudpError, protocol_violation};
use crate::packet::PACKET_HEADER_SIZE;
use crate::{MAX_BLOCK_SIZE, MAX_DATAGRAM_SIZE, PATH_FIELD_SIZE};

/// Sizes derived entirely from `(file_size, block_size, destination_path)`.
///
/// Once both peers have exchanged a handshake, they must agree on this
/// descriptor bit-for-bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmissionDescriptor {
    /// Caller-chosen block size, a power of two, `<= MAX_BLOCK_SIZE`.
    pub block_size: u32,
    /// `file_size / block_size + 1` — see the open question in the design
    /// notes: the `+1` is unconditional, not just for remainder bytes.
    pub number_packets: u32,
    /// `block_size + PACKET_HEADER_SIZE`.
    pub packet_size: u32,
    /// `(number_packets / 8) + 1`.
    pub bitmap_size_bytes: u32,
    /// Upper bound on packets the sender emits before yielding to feedback.
    pub max_packets_per_batch: u32,
}

impl TransmissionDescriptor {
    /// Derives a descriptor from a source file's byte length and the
    /// requested block size.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::ProtocolViolation`] if `block_size` is zero,
    /// not a power of two, or exceeds [`MAX_BLOCK_SIZE`].
    pub fn new(file_size: u64, block_size: u32) -> Result<Self, RbudpError> {
        validate_block_size(block_size)?;

        let number_packets = u32::try_from(file_size / u64::from(block_size))
            .map_err(|_| {
                protocol_violation(
                    "handshake",
                    format!("file_size {file_size} produces too many packets for a u32 count"),
                )
            })?
            + 1;
        let packet_size = block_size + PACKET_HEADER_SIZE as u32;
        let bitmap_size_bytes = crate::bitmap::bytes_for(number_packets) as u32;
        let max_packets_per_batch = MAX_DATAGRAM_SIZE / packet_size;

        Ok(Self {
            block_size,
            number_packets,
            packet_size,
            bitmap_size_bytes,
            max_packets_per_batch,
        })
    }

    /// Derives a descriptor on the receiver side, which learns
    /// `number_packets` and `block_size` directly from the handshake rather
    /// than computing `number_packets` from a file length.
    ///
    /// # Errors
    ///
    /// Returns [`RbudpError::ProtocolViolation`] if `block_size` is zero,
    /// not a power of two, or exceeds [`MAX_BLOCK_SIZE`].
    pub fn from_wire(number_packets: u32, block_size: u32) -> Result<Self, RbudpError> {
        validate_block_size(block_size)?;

        let packet_size = block_size + PACKET_HEADER_SIZE as u32;
        let bitmap_size_bytes = crate::bitmap::bytes_for(number_packets) as u32;
        let max_packets_per_batch = MAX_DATAGRAM_SIZE / packet_size;

        Ok(Self {
            block_size,
            number_packets,
            packet_size,
            bitmap_size_bytes,
            max_packets_per_batch,
        })
    }

    /// Total byte length of the file region both peers map:
    /// `number_packets * block_size`.
    #[must_use]
    pub fn region_size(&self) -> u64 {
        u64::from(self.number_packets) * u64::from(self.block_size)
    }

    /// The byte offset in the file region at which packet `id`'s block starts.
    #[must_use]
    pub fn offset_of(&self, id: u32) -> u64 {
        u64::from(id) * u64::from(self.block_size)
    }
}

/// Validates `block_size` is a nonzero power of two no larger than
/// [`MAX_BLOCK_SIZE`].
///
/// # Errors
///
/// Returns [`RbudpError::ProtocolViolation`] on any violation.
pub fn validate_block_size(block_size: u32) -> Result<(), RbudpError> {
    if block_size == 0 || !block_size.is_power_of_two() {
        return Err(protocol_violation(
            "handshake",
            format!("block_size {block_size} is not a nonzero power of two"),
        ));
    }
    if block_size > MAX_BLOCK_SIZE {
        return Err(protocol_violation(
            "handshake",
            format!("block_size {block_size} exceeds the datagram MTU ({MAX_BLOCK_SIZE})"),
        ));
    }
    Ok(())
}

/// Validates a destination path fits in the fixed-size wire field,
/// including its null terminator.
///
/// # Errors
///
/// Returns [`RbudpError::ProtocolViolation`] if the encoded path plus its
/// terminator would not fit in [`PATH_FIELD_SIZE`] bytes.
pub fn validate_path_len(path: &str) -> Result<(), RbudpError> {
    if path.len() + 1 > PATH_FIELD_SIZE {
        return Err(protocol_violation(
            "handshake",
            format!(
                "destination path of {} bytes exceeds the {} byte field (incl. terminator)",
                path.len(),
                PATH_FIELD_SIZE
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_block_transfer_s1() {
        // S1: block_size=4096, 64-byte source file.
        let descriptor = TransmissionDescriptor::new(64, 4096).unwrap();
        assert_eq!(descriptor.number_packets, 1);
        assert_eq!(descriptor.packet_size, 4100);
        assert_eq!(descriptor.bitmap_size_bytes, 1);
        assert_eq!(descriptor.region_size(), 4096);
    }

    #[test]
    fn exact_multiple_transfer_s2() {
        // S2: block_size=4, 8-byte source ("ABCDEFGH") -> 3 packets (the
        // unconditional +1), 12-byte receiver file.
        let descriptor = TransmissionDescriptor::new(8, 4).unwrap();
        assert_eq!(descriptor.number_packets, 3);
        assert_eq!(descriptor.region_size(), 12);
    }

    #[test]
    fn block_size_must_be_a_power_of_two() {
        assert!(TransmissionDescriptor::new(100, 0).is_err());
        assert!(TransmissionDescriptor::new(100, 100).is_err());
        assert!(TransmissionDescriptor::new(100, 128).is_ok());
    }

    #[test]
    fn block_size_cannot_exceed_the_datagram_mtu() {
        assert!(TransmissionDescriptor::new(100, MAX_BLOCK_SIZE).is_ok());
        assert!(TransmissionDescriptor::new(100, MAX_BLOCK_SIZE * 2).is_err());
    }

    #[test]
    fn max_packets_per_batch_is_a_conservative_window() {
        let descriptor = TransmissionDescriptor::new(1 << 20, 4096).unwrap();
        assert_eq!(descriptor.max_packets_per_batch, MAX_DATAGRAM_SIZE / 4100);
    }

    #[test]
    fn path_longer_than_field_is_rejected() {
        // S6: destination path of 2049 non-null bytes.
        let path = "a".repeat(2049);
        assert!(validate_path_len(&path).is_err());
        let ok_path = "a".repeat(2047);
        assert!(validate_path_len(&ok_path).is_ok());
    }

    #[test]
    fn from_wire_agrees_with_new_on_the_same_handshake_fields() {
        let sender = TransmissionDescriptor::new(8, 4).unwrap();
        let receiver = TransmissionDescriptor::from_wire(sender.number_packets, sender.block_size).unwrap();
        assert_eq!(sender, receiver);
    }

    #[test]
    fn offset_of_scales_with_block_size() {
        let descriptor = TransmissionDescriptor::new(100, 4).unwrap();
        assert_eq!(descriptor.offset_of(0), 0);
        assert_eq!(descriptor.offset_of(3), 12);
    }
}
