//! Binary framing for cloud payloads
//!
//! The cloud backend stores file content as raw bytes while the save layer
//! works with textual blobs, so payloads cross the wire in a small explicit
//! frame: magic, version byte, big-endian length, UTF-8 payload. Decoding
//! distinguishes every way a frame can be unusable.

use thiserror::Error;

use crate::domain::store::SaveBlob;

/// Frame magic prefix
const MAGIC: &[u8; 4] = b"SVPT";

/// Current frame version
const VERSION: u8 = 1;

/// Header size: magic + version + u32 length
const HEADER_LEN: usize = 4 + 1 + 4;

/// Errors raised while decoding a binary payload frame
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// Fewer bytes than a complete header
    #[error("Truncated frame: {actual} bytes, need at least {}", HEADER_LEN)]
    Truncated {
        /// Number of bytes received
        actual: usize,
    },

    /// Magic prefix mismatch
    #[error("Bad frame magic: {0:02x?}")]
    BadMagic([u8; 4]),

    /// Unknown frame version
    #[error("Unsupported frame version {0}")]
    UnsupportedVersion(u8),

    /// Declared payload length does not match the remaining bytes
    #[error("Frame length mismatch: header declares {declared} bytes, {actual} present")]
    LengthMismatch {
        /// Length from the header
        declared: usize,
        /// Bytes actually present after the header
        actual: usize,
    },

    /// Payload bytes are not valid UTF-8
    #[error("Frame payload is not valid UTF-8")]
    InvalidUtf8,
}

/// Encodes a blob into its framed binary form
#[must_use]
pub fn encode(blob: &SaveBlob) -> Vec<u8> {
    let payload = blob.as_str().as_bytes();
    let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
    frame.extend_from_slice(MAGIC);
    frame.push(VERSION);
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Decodes a framed binary payload back to its blob form
pub fn decode(bytes: &[u8]) -> Result<SaveBlob, WireError> {
    if bytes.len() < HEADER_LEN {
        return Err(WireError::Truncated {
            actual: bytes.len(),
        });
    }

    let magic: [u8; 4] = bytes[0..4].try_into().expect("slice length checked");
    if &magic != MAGIC {
        return Err(WireError::BadMagic(magic));
    }

    let version = bytes[4];
    if version != VERSION {
        return Err(WireError::UnsupportedVersion(version));
    }

    let declared = u32::from_be_bytes(bytes[5..9].try_into().expect("slice length checked")) as usize;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() != declared {
        return Err(WireError::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    let text = std::str::from_utf8(payload).map_err(|_| WireError::InvalidUtf8)?;
    Ok(SaveBlob::new(text))
}
