/*!
 * AI-OS Scheduling Core
 * Process lifecycle, ready/waiting queues and pluggable CPU scheduling
 */

pub mod core;
pub mod memory;
pub mod monitoring;
pub mod process;
pub mod scheduler;

// Re-exports
pub use crate::core::clock::{Clock, ManualClock, MonotonicClock};
pub use crate::core::config::SchedulerConfig;
pub use crate::core::errors::{ErrorKind, SchedulerError, SchedulerResult, SerializableError};
pub use crate::core::limits::{PARENT_TERMINATED_EXIT_CODE, SHUTDOWN_EXIT_CODE};
pub use crate::core::types::{Pid, Timestamp, IDLE_PID};
pub use memory::{
    MemoryCollaborator, MemoryError, QuantumMemory, Segment, SegmentAttrs, SegmentRequest,
    SimulatedMemory, SimulatedQuantumMemory,
};
pub use monitoring::{init_tracing, Event, EventLog, Severity};
pub use process::{
    Priority, ProcessContext, ProcessFlags, ProcessInfo, ProcessSpec, ProcessState, QueueSnapshot,
    TerminationReason, WaitReason,
};
pub use scheduler::{
    Scheduler, SchedulerBuilder, SchedulerState, SchedulerStats, SchedulerTask,
    SchedulingPolicy, TickOutcome,
};
