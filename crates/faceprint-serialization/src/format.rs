// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Persisted header

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{CodecError, CodecResult};

/// Format magic at the start of every persisted store
pub const MAGIC: [u8; 4] = *b"FPRT";

/// Current format version
pub const FORMAT_VERSION: u8 = 1;

/// Header size in bytes: magic(4) + version(1) + payload_len(4) + crc32(4)
pub const HEADER_LEN: usize = 13;

const ERASED_BYTE: u8 = 0xFF;

/// Decoded header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub payload_len: u32,
    pub checksum: u32,
}

impl Header {
    /// Header describing `payload`
    pub fn for_payload(payload: &[u8]) -> CodecResult<Self> {
        let payload_len =
            u32::try_from(payload.len()).map_err(|_| CodecError::PayloadTooLarge(payload.len()))?;
        Ok(Self {
            version: FORMAT_VERSION,
            payload_len,
            checksum: crc32fast::hash(payload),
        })
    }

    /// Parse and validate the first [`HEADER_LEN`] bytes
    pub fn parse(bytes: &[u8]) -> CodecResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::Truncated {
                field: "header",
                offset: 0,
                needed: HEADER_LEN,
                available: bytes.len(),
            });
        }

        let mut found = [0u8; 4];
        found.copy_from_slice(&bytes[0..4]);
        if found != MAGIC {
            return Err(CodecError::BadMagic { found });
        }

        let version = bytes[4];
        if version != FORMAT_VERSION {
            return Err(CodecError::UnsupportedVersion(version));
        }

        Ok(Self {
            version,
            payload_len: LittleEndian::read_u32(&bytes[5..9]),
            checksum: LittleEndian::read_u32(&bytes[9..13]),
        })
    }

    /// Encoded header bytes
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&MAGIC);
        bytes[4] = self.version;
        LittleEndian::write_u32(&mut bytes[5..9], self.payload_len);
        LittleEndian::write_u32(&mut bytes[9..13], self.checksum);
        bytes
    }

    /// Header plus payload length in bytes
    pub fn total_len(&self) -> usize {
        HEADER_LEN + self.payload_len as usize
    }

    /// Check `payload` against the stored length and checksum
    pub fn verify_payload(&self, payload: &[u8]) -> CodecResult<()> {
        let expected_len = self.payload_len as usize;
        if payload.len() < expected_len {
            return Err(CodecError::Truncated {
                field: "payload",
                offset: HEADER_LEN,
                needed: expected_len,
                available: payload.len(),
            });
        }
        let actual = crc32fast::hash(&payload[..expected_len]);
        if actual != self.checksum {
            return Err(CodecError::ChecksumMismatch {
                expected: self.checksum,
                actual,
            });
        }
        Ok(())
    }
}

/// What the first bytes of the flash region contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderStatus {
    /// Every header byte reads as erased; nothing was ever stored
    Erased,
    /// A valid header; the full image is `header.total_len()` bytes
    Valid(Header),
    /// Anything else
    Invalid(CodecError),
}

/// Classify the bytes at the start of the flash region
pub fn inspect_header(bytes: &[u8]) -> HeaderStatus {
    let prefix = &bytes[..bytes.len().min(HEADER_LEN)];
    if prefix.len() == HEADER_LEN && prefix.iter().all(|b| *b == ERASED_BYTE) {
        return HeaderStatus::Erased;
    }
    match Header::parse(bytes) {
        Ok(header) => HeaderStatus::Valid(header),
        Err(err) => HeaderStatus::Invalid(err),
    }
}
