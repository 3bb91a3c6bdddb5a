/*!
 * Monitoring
 * Structured tracing and bounded error/warning history
 */

mod events;
mod tracer;

pub use events::{Event, EventLog, Severity};
pub use tracer::init_tracing;
