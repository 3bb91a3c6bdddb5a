/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::types::Pid;
use crate::memory::MemoryError;
use crate::process::ProcessState;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failure kinds reported to the syscall/IPC layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotInitialized,
    NotFound,
    InvalidState,
    ResourceExhausted,
    InvalidArgument,
}

impl ErrorKind {
    #[inline(always)]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::NotFound => "not_found",
            Self::InvalidState => "invalid_state",
            Self::ResourceExhausted => "resource_exhausted",
            Self::InvalidArgument => "invalid_argument",
        }
    }
}

/// Scheduling core errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SchedulerError {
    #[error("Scheduler not initialized")]
    #[diagnostic(
        code(scheduler::not_initialized),
        help("Call initialize() or build the scheduler through SchedulerBuilder first.")
    )]
    NotInitialized,

    #[error("Process {0} not found")]
    #[diagnostic(
        code(process::not_found),
        help("The process may have been reaped or never existed. Check PID validity.")
    )]
    NotFound(Pid),

    #[error("Cannot {operation} process {pid} in state {state}")]
    #[diagnostic(
        code(process::invalid_state),
        help("Operation cannot be performed in the current process state.")
    )]
    InvalidState {
        pid: Pid,
        state: ProcessState,
        operation: String,
    },

    #[error("Resource exhausted: {0}")]
    #[diagnostic(
        code(memory::resource_exhausted),
        help("The memory collaborator refused the allocation. Terminate unused processes.")
    )]
    ResourceExhausted(String),

    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(scheduler::invalid_argument),
        help("Priorities range from 0 (idle) to 4 (realtime).")
    )]
    InvalidArgument(String),
}

impl SchedulerError {
    pub fn invalid_state(pid: Pid, state: ProcessState, operation: impl Into<String>) -> Self {
        Self::InvalidState {
            pid,
            state,
            operation: operation.into(),
        }
    }

    /// Failure kind for translation into user-visible codes
    #[inline]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
        }
    }

    /// Pid the error refers to, when there is one
    pub const fn pid(&self) -> Option<Pid> {
        match self {
            Self::NotFound(pid) | Self::InvalidState { pid, .. } => Some(*pid),
            _ => None,
        }
    }
}

// Allow conversion from MemoryError to SchedulerError
impl From<MemoryError> for SchedulerError {
    fn from(err: MemoryError) -> Self {
        SchedulerError::ResourceExhausted(err.to_string())
    }
}

/// Result type for scheduling core operations
///
/// # Must Use
/// Lifecycle operations can fail and must be handled to prevent resource leaks
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Serializable error representation for API responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SerializableError {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<Pid>,
}

impl SerializableError {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            pid: None,
        }
    }
}

impl From<SchedulerError> for SerializableError {
    fn from(err: SchedulerError) -> Self {
        Self {
            error_type: err.kind().as_str().to_string(),
            message: err.to_string(),
            pid: err.pid(),
        }
    }
}
