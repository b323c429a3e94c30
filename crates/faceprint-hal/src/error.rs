// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for flash operations

use alloc::string::String;
use core::fmt;

/// Flash operation that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashOperation {
    /// Whole-region erase
    Erase,
    /// Program of one chunk
    Program,
    /// Read-back
    Read,
    /// Status register poll
    PollStatus,
}

impl FlashOperation {
    /// Get operation name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashOperation::Erase => "erase",
            FlashOperation::Program => "program",
            FlashOperation::Read => "read",
            FlashOperation::PollStatus => "poll_status",
        }
    }
}

/// Flash adapter errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashError {
    /// The device rejected or failed a command
    Device {
        /// Operation in progress
        operation: FlashOperation,
        /// Address of the operation
        address: u32,
        /// Device-specific error rendered with `Debug`
        detail: String,
    },

    /// The device stayed busy past the poll timeout
    BusyTimeout {
        /// Operation being waited on
        operation: FlashOperation,
        /// Address of the operation
        address: u32,
        /// Microseconds spent polling
        waited_us: u64,
    },

    /// Access falls outside the device window
    AddressOutOfRange {
        /// First byte of the access
        address: u32,
        /// Length of the access in bytes
        len: usize,
        /// Exclusive end of the device window
        window_end: u64,
    },

    /// 16-bit access at an odd address
    Misaligned {
        /// Offending address
        address: u32,
        /// Required alignment in bytes
        alignment: usize,
    },

    /// Chunk is larger than the packing buffer
    ChunkTooLarge {
        /// Requested chunk length
        len: usize,
        /// Maximum chunk length
        max: usize,
    },
}

impl fmt::Display for FlashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlashError::Device {
                operation,
                address,
                detail,
            } => {
                write!(
                    f,
                    "Flash {} failed at 0x{:08X}: {}",
                    operation.as_str(),
                    address,
                    detail
                )
            }
            FlashError::BusyTimeout {
                operation,
                address,
                waited_us,
            } => {
                write!(
                    f,
                    "Flash still busy after {} us ({} at 0x{:08X})",
                    waited_us,
                    operation.as_str(),
                    address
                )
            }
            FlashError::AddressOutOfRange {
                address,
                len,
                window_end,
            } => {
                write!(
                    f,
                    "Flash access of {} bytes at 0x{:08X} exceeds window end 0x{:08X}",
                    len, address, window_end
                )
            }
            FlashError::Misaligned { address, alignment } => {
                write!(
                    f,
                    "Flash address 0x{:08X} is not {}-byte aligned",
                    address, alignment
                )
            }
            FlashError::ChunkTooLarge { len, max } => {
                write!(f, "Flash chunk of {} bytes exceeds maximum {}", len, max)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FlashError {}

impl FlashError {
    /// Check if the error is a transient device condition
    pub fn is_timeout(&self) -> bool {
        matches!(self, FlashError::BusyTimeout { .. })
    }
}

/// Result type for flash operations
pub type FlashResult<T> = core::result::Result<T, FlashError>;
