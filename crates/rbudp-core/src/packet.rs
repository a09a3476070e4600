//! The 4-byte header + payload datagram frame.
//!
//! No checksum, no version, no flags — the control channel's reliability is
//! the session's sole synchronization mechanism; the data channel only ever
//! carries `(id, payload)`.

/// Size, in bytes, of the packet header (just the little-endian `id`).
pub const PACKET_HEADER_SIZE: usize = 4;

/// Encodes `id` and `payload` into `out`.
///
/// `out` must be exactly `PACKET_HEADER_SIZE + block_size` bytes long.
/// `payload` may be shorter than `block_size` bytes (the last logical
/// block); the remaining payload bytes in `out` are zeroed.
///
/// # Panics
///
/// Panics if `payload.len()` exceeds the payload region of `out`.
pub fn encode(id: u32, payload: &[u8], out: &mut [u8]) {
    out[0..PACKET_HEADER_SIZE].copy_from_slice(&id.to_le_bytes());
    let body = &mut out[PACKET_HEADER_SIZE..];
    assert!(
        payload.len() <= body.len(),
        "payload longer than the packet's block size"
    );
    body[..payload.len()].copy_from_slice(payload);
    body[payload.len()..].fill(0);
}

/// Decodes the packet id from `buf`'s header.
///
/// # Panics
///
/// Panics if `buf` is shorter than [`PACKET_HEADER_SIZE`].
#[must_use]
pub fn decode_id(buf: &[u8]) -> u32 {
    let mut header = [0u8; PACKET_HEADER_SIZE];
    header.copy_from_slice(&buf[0..PACKET_HEADER_SIZE]);
    u32::from_le_bytes(header)
}

/// Decodes a packet into its id and a reference to its payload slice.
///
/// # Panics
///
/// Panics if `buf` is shorter than [`PACKET_HEADER_SIZE`].
#[must_use]
pub fn decode(buf: &[u8]) -> (u32, &[u8]) {
    (decode_id(buf), &buf[PACKET_HEADER_SIZE..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_id_round_trips() {
        let mut buf = [0u8; 4 + 8];
        encode(42, b"abcdefgh", &mut buf);
        let (id, payload) = decode(&buf);
        assert_eq!(id, 42);
        assert_eq!(payload, b"abcdefgh");
    }

    #[test]
    fn encode_zero_pads_a_short_payload() {
        let mut buf = [0xFFu8; 4 + 8];
        encode(1, b"ab", &mut buf);
        let (id, payload) = decode(&buf);
        assert_eq!(id, 1);
        assert_eq!(payload, b"ab\0\0\0\0\0\0");
    }

    #[test]
    fn header_is_little_endian() {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&0x0102_0304u32.to_le_bytes());
        assert_eq!(decode_id(&buf), 0x0102_0304);
        assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    #[should_panic(expected = "payload longer")]
    fn encode_panics_on_oversized_payload() {
        let mut buf = [0u8; 4 + 2];
        encode(0, b"abc", &mut buf);
    }
}
