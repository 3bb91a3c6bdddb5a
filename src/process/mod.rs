/*!
 * Process Module
 * Process descriptors, the process table, queues and lifecycle transitions
 */

pub mod descriptor;
pub mod lifecycle;
pub mod queues;
pub mod table;
pub mod types;
pub mod validation;

// Re-export for convenience
pub use descriptor::{Process, ProcessInfo};
pub use queues::{QueueManager, QueueSnapshot};
pub use table::ProcessTable;
pub use types::*;
pub use validation::can_transition;
