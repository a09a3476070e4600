//! Fixed-size wire encoding of the handshake's destination-path field.
//!
//! The handshake always transmits a fixed [`PATH_FIELD_SIZE`]-byte block
//! regardless of the actual path length. The buffer is zeroed before
//! encoding so trailing bytes never leak stack contents, per the design
//! notes' resolution of that open question.

use crate::error::{RbudpError, protocol_violation};
use crate::PATH_FIELD_SIZE;

/// Encodes `path` into a zero-padded, null-terminated [`PATH_FIELD_SIZE`]-byte field.
///
/// # Errors
///
/// Returns [`RbudpError::ProtocolViolation`] if `path` (plus its null
/// terminator) does not fit in [`PATH_FIELD_SIZE`] bytes.
pub fn encode(path: &str) -> Result<[u8; PATH_FIELD_SIZE], RbudpError> {
    crate::descriptor::validate_path_len(path)?;

    let mut field = [0u8; PATH_FIELD_SIZE];
    field[..path.len()].copy_from_slice(path.as_bytes());
    Ok(field)
}

/// Decodes a null-terminated UTF-8 path out of a raw [`PATH_FIELD_SIZE`]-byte field.
///
/// # Errors
///
/// Returns [`RbudpError::ProtocolViolation`] if the bytes up to the first
/// null (or the whole field, if unterminated) are not valid UTF-8.
pub fn decode(field: &[u8]) -> Result<String, RbudpError> {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    std::str::from_utf8(&field[..end])
        .map(str::to_owned)
        .map_err(|error| protocol_violation("handshake", format!("destination path is not valid UTF-8: {error}")))
}
