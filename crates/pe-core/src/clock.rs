// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling

use std::time::Instant;

/// A clock that provides the current time.
///
/// The Main Loop and Heartbeat Ticker both depend on elapsed-time
/// comparisons (idle timeout, drain deadline, tick interval); routing
/// them through this trait lets tests drive a [`FakeClock`] instead of
/// sleeping in wall time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Real system clock, used in the executor binary.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake_clock::FakeClock;

#[cfg(any(test, feature = "test-support"))]
mod fake_clock {
    use super::Clock;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    /// Fake clock for testing with controllable, monotonically advancing time.
    #[derive(Clone)]
    pub struct FakeClock {
        current: Arc<Mutex<Instant>>,
    }

    impl FakeClock {
        pub fn new() -> Self {
            Self {
                current: Arc::new(Mutex::new(Instant::now())),
            }
        }

        /// Advance the clock by the given duration.
        pub fn advance(&self, duration: Duration) {
            *self.current.lock() += duration;
        }
    }

    impl Default for FakeClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            *self.current.lock()
        }
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
