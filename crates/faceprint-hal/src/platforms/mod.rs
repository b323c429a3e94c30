// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Platform implementations
///
/// The simulated flash mirrors the behaviour of an OSPI NOR part (erase to
/// all-ones, AND-only programming, busy status after each command) so the
/// persistence path can run on a host. Real targets implement
/// [`NorFlash`](crate::hal::NorFlash) against their vendor driver.
pub mod clock;
pub mod simulated;

pub use clock::ManualClock;
#[cfg(feature = "std")]
pub use clock::StdClock;
pub use simulated::{FlashOp, SimulatedFlashError, SimulatedNorFlash};
