/*!
 * Event Log
 *
 * Bounded error and warning history backed by ringbuf. Each buffer keeps the
 * most recent entries; pushing into a full buffer discards the oldest one.
 */

use crate::core::errors::{ErrorKind, SchedulerError};
use crate::core::limits::EVENT_LOG_CAPACITY;
use crate::core::types::{Pid, Timestamp};
use ringbuf::{traits::*, HeapRb};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// One recorded error or warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: Timestamp,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<Pid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String,
}

/// Error and warning ring buffers
pub struct EventLog {
    errors: HeapRb<Event>,
    warnings: HeapRb<Event>,
    total_errors: u64,
    total_warnings: u64,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_LOG_CAPACITY)
    }

    /// Capacity per buffer, clamped to at least one entry
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            errors: HeapRb::new(capacity),
            warnings: HeapRb::new(capacity),
            total_errors: 0,
            total_warnings: 0,
        }
    }

    pub fn record_error(&mut self, timestamp: Timestamp, error: &SchedulerError) {
        self.total_errors += 1;
        self.errors.push_overwrite(Event {
            timestamp,
            severity: Severity::Error,
            pid: error.pid(),
            kind: Some(error.kind()),
            message: error.to_string(),
        });
    }

    pub fn record_warning(
        &mut self,
        timestamp: Timestamp,
        pid: Option<Pid>,
        message: impl Into<String>,
    ) {
        self.total_warnings += 1;
        self.warnings.push_overwrite(Event {
            timestamp,
            severity: Severity::Warning,
            pid,
            kind: None,
            message: message.into(),
        });
    }

    /// Retained errors, oldest first
    pub fn errors(&self) -> Vec<Event> {
        self.errors.iter().cloned().collect()
    }

    /// Retained warnings, oldest first
    pub fn warnings(&self) -> Vec<Event> {
        self.warnings.iter().cloned().collect()
    }

    /// Errors ever recorded, including discarded ones
    pub fn total_errors(&self) -> u64 {
        self.total_errors
    }

    pub fn total_warnings(&self) -> u64 {
        self.total_warnings
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("errors", &self.errors.occupied_len())
            .field("warnings", &self.warnings.occupied_len())
            .field("total_errors", &self.total_errors)
            .field("total_warnings", &self.total_warnings)
            .finish()
    }
}
