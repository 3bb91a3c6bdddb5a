/*!
 * Core Types
 * Common types used across the scheduling core
 */

use std::time::Duration;

/// Process ID type
pub type Pid = u32;

/// Address type for memory segments
pub type Address = usize;

/// Size type for memory segments
pub type Size = usize;

/// Timestamp in microseconds since the clock epoch
pub type Timestamp = u64;

/// Reserved pid of the idle process
pub const IDLE_PID: Pid = 0;

/// First pid handed out to user processes
pub const FIRST_USER_PID: Pid = 1;

/// Duration between two timestamps, saturating at zero if the clock moved backwards
#[inline]
#[must_use]
pub fn elapsed_between(earlier: Timestamp, now: Timestamp) -> Duration {
    Duration::from_micros(now.saturating_sub(earlier))
}
