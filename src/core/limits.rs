/*!
 * System Limits and Constants
 *
 * Centralized location for scheduling limits, thresholds, and default values.
 * Organized by domain for maintainability and discoverability.
 */

use std::time::Duration;

// =============================================================================
// SCHEDULING
// =============================================================================

/// Default time slice handed to user processes (10ms)
pub const DEFAULT_TIME_SLICE: Duration = Duration::from_millis(10);

/// Time slice of the idle process
pub const INFINITE_TIME_SLICE: Duration = Duration::MAX;

/// Maximum run time before the engine forces a reschedule (100ms)
pub const DEFAULT_MAX_EXECUTION_WITHOUT_YIELD: Duration = Duration::from_millis(100);

/// Accumulated execution time after which multilevel feedback demotes (1s)
pub const DEFAULT_AGING_THRESHOLD: Duration = Duration::from_millis(1000);

/// Priority levels added to a quantum-flagged process under quantum-aware scheduling
pub const DEFAULT_QUANTUM_BOOST: u8 = 2;

/// Default period of the background tick task (10ms)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Per-level time slice growth under multilevel feedback (50% per level below realtime)
pub const FEEDBACK_SLICE_STEP: f64 = 0.5;

// =============================================================================
// OBSERVABILITY
// =============================================================================

/// Capacity of each error/warning ring buffer
pub const EVENT_LOG_CAPACITY: usize = 100;

// =============================================================================
// MEMORY
// =============================================================================

/// Simulated memory pool backing the default collaborator (64MB)
pub const DEFAULT_MEMORY_CAPACITY: usize = 64 * 1024 * 1024;

/// Base address of the first simulated segment
pub const SEGMENT_BASE_ADDRESS: usize = 0x1000_0000;

/// Segment alignment for the simulated allocator (4KB page)
pub const SEGMENT_ALIGNMENT: usize = 4 * 1024;

/// Default code segment size (64KB)
pub const DEFAULT_CODE_SEGMENT: usize = 64 * 1024;

/// Default data segment size (64KB)
pub const DEFAULT_DATA_SEGMENT: usize = 64 * 1024;

/// Default stack segment size (16KB)
pub const DEFAULT_STACK_SEGMENT: usize = 16 * 1024;

/// Quantum registers granted to a quantum workload that does not ask for a count
pub const DEFAULT_QUANTUM_REGISTERS: usize = 8;

/// Register pool of the simulated quantum collaborator
pub const DEFAULT_QUANTUM_REGISTER_POOL: usize = 64;

// =============================================================================
// PROCESS
// =============================================================================

/// Exit code assigned to children terminated because their parent went away
pub const PARENT_TERMINATED_EXIT_CODE: i32 = -1;

/// Exit code assigned to processes terminated by shutdown
pub const SHUTDOWN_EXIT_CODE: i32 = -2;
