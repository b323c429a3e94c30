// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// NOR/OSPI flash device traits.
pub mod flash;
/// Hardware Abstraction Layer (HAL) trait definitions for Faceprint targets
///
/// This module defines platform-agnostic traits that must be implemented
/// by each platform to provide:
/// - Flash access (NorFlash)
/// - Time management (TimeProvider)

/// Timekeeping abstractions (monotonic timers, delays).
pub mod time;

// Re-export trait types
pub use flash::{FlashStatus, FlashWords, FlashWordsMut, NorFlash, WordWidth};
pub use time::TimeProvider;
