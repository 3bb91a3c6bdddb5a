/*!
 * Time Sources
 * Injected clocks so scheduling decisions stay deterministic under test
 */

use crate::core::types::Timestamp;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time source consulted by every scheduling decision
pub trait Clock: Send + Sync {
    /// Microseconds since the clock epoch
    fn now(&self) -> Timestamp;
}

/// Wall-clock backed monotonic time, epoch at construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Timestamp {
        self.epoch.elapsed().as_micros() as Timestamp
    }
}

/// Manually advanced clock for replayable tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(micros: Timestamp) -> Self {
        Self {
            micros: AtomicU64::new(micros),
        }
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        self.micros
            .fetch_add(by.as_micros() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, micros: Timestamp) {
        self.micros.store(micros, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Timestamp {
        self.micros.load(Ordering::SeqCst)
    }
}
