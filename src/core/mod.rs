/*!
 * Core Module
 * Fundamental kernel types, configuration and error handling
 */

pub mod clock;
pub mod config;
pub mod errors;
pub mod guard;
pub mod limits;
pub mod serde;
pub mod types;

// Re-export for convenience
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::SchedulerConfig;
pub use errors::*;
pub use guard::SwitchGuard;
pub use types::*;
