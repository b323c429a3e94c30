// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for encoding and decoding

use faceprint_templates::TemplateError;

/// Result type alias using CodecError
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Codec errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Input ended before a field was complete
    #[error("Truncated {field} at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        field: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Header does not start with the format magic
    #[error("Bad magic {found:02X?}")]
    BadMagic { found: [u8; 4] },

    /// Header written by an unknown format version
    #[error("Unsupported format version {0}")]
    UnsupportedVersion(u8),

    /// Payload checksum does not match the header
    #[error("Checksum mismatch: header {expected:#010x}, payload {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// Identity name is not valid UTF-8
    #[error("Identity name at offset {offset} is not valid UTF-8")]
    InvalidName { offset: usize },

    /// Payload length does not fit the 4-byte header field
    #[error("Payload of {0} bytes exceeds the format limit")]
    PayloadTooLarge(usize),

    /// Chunk size of zero
    #[error("Chunk size must be non-zero")]
    InvalidChunkSize,

    /// Image would run past the end of the 32-bit address space
    #[error("{len} bytes at {base_address:#010x} overflow the address space")]
    AddressOverflow { base_address: u32, len: usize },

    /// Decoded content violates a store invariant
    #[error("Invalid template data: {0}")]
    Template(#[from] TemplateError),
}
