// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/// Time and delay abstraction for embedded platforms
///
/// The flash adapter measures its busy-poll timeout against this clock, so a
/// test clock that advances on `delay_us` lets a stuck device time out
/// without real waiting.
pub trait TimeProvider {
    /// Get current time in microseconds since system boot
    ///
    /// # Returns
    /// Monotonic timestamp in microseconds
    fn get_time_us(&self) -> u64;

    /// Block for the specified number of microseconds
    ///
    /// # Arguments
    /// * `us` - Microseconds to delay
    fn delay_us(&self, us: u32);

    /// Block for the specified number of milliseconds
    ///
    /// # Arguments
    /// * `ms` - Milliseconds to delay
    fn delay_ms(&self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }

    /// Get current time in milliseconds since system boot
    fn get_time_ms(&self) -> u64 {
        self.get_time_us() / 1000
    }
}

impl<T: TimeProvider + ?Sized> TimeProvider for &T {
    fn get_time_us(&self) -> u64 {
        (**self).get_time_us()
    }

    fn delay_us(&self, us: u32) {
        (**self).delay_us(us)
    }
}
