/*!
 * Serde Helper Functions
 * Skip predicates shared by snapshot and statistics types
 */

pub use serde_with::{serde_as, DurationMicroSeconds, DurationMilliSeconds};

/// Skip serializing if Option is None
#[inline]
pub const fn is_none<T>(value: &Option<T>) -> bool {
    value.is_none()
}

/// Skip serializing if bool is false
#[inline]
pub const fn is_false(value: &bool) -> bool {
    !*value
}

#[inline]
pub const fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}
