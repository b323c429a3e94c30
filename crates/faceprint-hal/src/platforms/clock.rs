// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Clock implementations

use alloc::sync::Arc;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::hal::TimeProvider;

/// Manually advanced clock
///
/// `delay_us` advances the clock instead of sleeping. Clones share the same
/// time, so a test can hand one clone to the flash adapter and keep another
/// to inspect or advance time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_us: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock at t = 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by `us` microseconds
    pub fn advance_us(&self, us: u64) {
        self.now_us.fetch_add(us, Ordering::SeqCst);
    }

    /// Advance the clock by `ms` milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance_us(ms * 1000);
    }
}

impl TimeProvider for ManualClock {
    fn get_time_us(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }

    fn delay_us(&self, us: u32) {
        self.advance_us(us as u64);
    }
}

/// Wall clock backed by `std::time::Instant`
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    started: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Create a clock whose zero is now
    pub fn new() -> Self {
        Self {
            started: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeProvider for StdClock {
    fn get_time_us(&self) -> u64 {
        self.started.elapsed().as_micros() as u64
    }

    fn delay_us(&self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let observer = clock.clone();
        clock.delay_ms(5);
        assert_eq!(observer.get_time_us(), 5_000);
        observer.advance_us(7);
        assert_eq!(clock.get_time_us(), 5_007);
    }
}
