/*!
 * Switch Guard
 *
 * Non-blocking RAII guard marking a scheduling decision as in flight.
 * Acquisition never waits: a second tick observing the flag is dropped
 * instead of interleaving with the running decision.
 */

use std::sync::atomic::{AtomicBool, Ordering};

/// Held for the duration of one scheduling decision
#[must_use = "the switch is released as soon as the guard is dropped"]
pub struct SwitchGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SwitchGuard<'a> {
    /// Try to mark a switch as in progress, `None` if one already is
    #[inline]
    pub fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag })
    }

    #[inline]
    pub fn is_held(flag: &AtomicBool) -> bool {
        flag.load(Ordering::Acquire)
    }
}

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
