// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

//! # Faceprint HAL
//!
//! Hardware abstraction for the raw NOR/OSPI flash that holds the template store.
//!
//! This crate provides:
//! - **HAL traits** (`hal` module) - `NorFlash` device access and `TimeProvider` clocks
//! - **Flash adapter** (`adapter` module) - erase/program/read with a bounded busy-poll
//! - **Word packing** (`packing` module) - 8-bit stream <-> 16-bit flash words
//! - **Platforms** (`platforms` module) - in-memory simulated flash and clocks
//!
//! ## Usage
//!
//! ```rust
//! use faceprint_hal::prelude::*;
//!
//! let device = SimulatedNorFlash::new(0xC000_0000, 4096, WordWidth::HalfWord);
//! let clock = ManualClock::new();
//! let mut flash = FlashAdapter::new(device, clock, FlashAdapterConfig::default());
//!
//! flash.erase().unwrap();
//! flash.program(0xC000_0000, &[1, 2, 3, 4]).unwrap();
//! assert_eq!(flash.read(0xC000_0000, 4).unwrap(), vec![1, 2, 3, 4]);
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default) - wall clock (`StdClock`) and `std::error::Error` impls

extern crate alloc;

/// Hardware abstraction traits shared by all platforms.
pub mod hal;

/// Busy-poll aware flash adapter.
pub mod adapter;

/// Error types for flash operations.
pub mod error;

/// Byte <-> 16-bit word packing.
pub mod packing;

/// Concrete platform implementations (simulated flash, clocks).
pub mod platforms;

pub use adapter::{FlashAdapter, FlashAdapterConfig, FlashStats, MAX_CHUNK_BYTES};
pub use error::{FlashError, FlashOperation, FlashResult};
pub use hal::{FlashStatus, FlashWords, FlashWordsMut, NorFlash, TimeProvider, WordWidth};
pub use platforms::{FlashOp, ManualClock, SimulatedFlashError, SimulatedNorFlash};

#[cfg(feature = "std")]
pub use platforms::StdClock;

/// Prelude module for convenient imports
///
/// ```rust
/// use faceprint_hal::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adapter::*;
    pub use crate::error::*;
    pub use crate::hal::*;
    pub use crate::platforms::*;
}

/// Erase pattern of a NOR cell (all bits set)
pub const ERASED_BYTE: u8 = 0xFF;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
