/*!
 * Scheduler Module
 * Scheduling engine, policies, statistics and the shared scheduler handle
 */

mod builder;
mod handle;
mod operations;
mod policy;
mod state;
mod stats;
mod task;

pub use builder::SchedulerBuilder;
pub use handle::{Scheduler, TickOutcome};
pub use policy::{feedback_slice, SchedulingPolicy};
pub use state::SchedulerState;
pub use stats::SchedulerStats;
pub use task::{SchedulerCommand, SchedulerTask};
