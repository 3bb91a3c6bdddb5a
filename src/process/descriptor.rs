/*!
 * Process Descriptor
 * Per-process bookkeeping owned by the process table
 */

use super::types::*;
use crate::core::limits;
use crate::core::serde::{is_false, is_none, is_zero_u64, DurationMicroSeconds};
use crate::core::types::{elapsed_between, Pid, Timestamp, IDLE_PID};
use crate::memory::{QuantumSegment, Segment};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::BTreeSet;
use std::time::Duration;

/// Process descriptor
#[derive(Debug, Clone)]
pub struct Process {
    pub pid: Pid,
    pub name: String,
    pub state: ProcessState,
    pub priority: Priority,
    pub flags: ProcessFlags,
    pub creation_time: Timestamp,
    pub execution_time: Duration,
    /// Stamp of the last dispatch; the execution limit is measured from here
    pub last_scheduled: Option<Timestamp>,
    /// Start of the current slice, renewed without a switch
    pub slice_started: Option<Timestamp>,
    /// Running time up to this stamp is already in `execution_time`
    pub accounted_at: Option<Timestamp>,
    /// Slice granted at the last dispatch
    pub time_slice: Duration,
    /// Slice before any policy scaling
    pub base_time_slice: Duration,
    pub parent_pid: Option<Pid>,
    pub children: BTreeSet<Pid>,
    pub context: ProcessContext,
    pub exit_code: Option<i32>,
    pub termination_reason: Option<TerminationReason>,
    pub waiting_reason: Option<WaitReason>,
    pub wait_data: Option<u64>,
    pub wait_start_time: Option<Timestamp>,
    pub segments: Vec<Segment>,
    pub quantum_segment: Option<QuantumSegment>,
    pub dispatches: u64,
}

impl Process {
    pub fn new(pid: Pid, name: impl Into<String>, priority: Priority, now: Timestamp) -> Self {
        Self {
            pid,
            name: name.into(),
            state: ProcessState::Created,
            priority,
            flags: ProcessFlags::empty(),
            creation_time: now,
            execution_time: Duration::ZERO,
            last_scheduled: None,
            slice_started: None,
            accounted_at: None,
            time_slice: limits::DEFAULT_TIME_SLICE,
            base_time_slice: limits::DEFAULT_TIME_SLICE,
            parent_pid: None,
            children: BTreeSet::new(),
            context: ProcessContext::default(),
            exit_code: None,
            termination_reason: None,
            waiting_reason: None,
            wait_data: None,
            wait_start_time: None,
            segments: Vec::new(),
            quantum_segment: None,
            dispatches: 0,
        }
    }

    /// The reserved idle process: pid 0, idle priority, never expires
    pub fn idle(now: Timestamp) -> Self {
        let mut idle = Self::new(IDLE_PID, "idle", Priority::Idle, now);
        idle.flags = ProcessFlags::KERNEL;
        idle.state = ProcessState::Ready;
        idle.time_slice = limits::INFINITE_TIME_SLICE;
        idle.base_time_slice = limits::INFINITE_TIME_SLICE;
        idle
    }

    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        self.pid == IDLE_PID
    }

    #[inline(always)]
    pub fn is_kernel(&self) -> bool {
        self.flags.contains(ProcessFlags::KERNEL)
    }

    #[inline(always)]
    pub fn is_quantum(&self) -> bool {
        self.flags.contains(ProcessFlags::QUANTUM)
    }

    #[inline(always)]
    pub fn is_live(&self) -> bool {
        self.state.is_live()
    }

    /// Time since the last dispatch
    #[inline]
    pub fn running_for(&self, now: Timestamp) -> Duration {
        self.last_scheduled
            .map(|t| elapsed_between(t, now))
            .unwrap_or_default()
    }

    /// Time into the current slice
    #[inline]
    pub fn slice_elapsed(&self, now: Timestamp) -> Duration {
        self.slice_started
            .map(|t| elapsed_between(t, now))
            .unwrap_or_default()
    }

    #[inline]
    pub fn slice_expired(&self, now: Timestamp) -> bool {
        self.slice_elapsed(now) >= self.time_slice
    }

    fn unaccounted(&self, now: Timestamp) -> Duration {
        match (self.state, self.accounted_at) {
            (ProcessState::Running, Some(t)) => elapsed_between(t, now),
            _ => Duration::ZERO,
        }
    }

    /// Accumulated execution time including the current, unaccounted run
    pub fn execution_time_at(&self, now: Timestamp) -> Duration {
        self.execution_time + self.unaccounted(now)
    }

    /// Fold the unaccounted part of the current run into `execution_time`
    pub(crate) fn charge(&mut self, now: Timestamp) {
        self.execution_time += self.unaccounted(now);
        if self.state == ProcessState::Running {
            self.accounted_at = Some(now);
        }
    }

    /// Stamp a dispatch: execution limit, slice and accounting all start at `now`
    pub(crate) fn mark_dispatched(&mut self, now: Timestamp) {
        self.last_scheduled = Some(now);
        self.slice_started = Some(now);
        self.accounted_at = Some(now);
    }

    /// Read-only snapshot
    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            pid: self.pid,
            name: self.name.clone(),
            state: self.state,
            priority: self.priority,
            flags: self.flags,
            creation_time: self.creation_time,
            execution_time: self.execution_time,
            last_scheduled: self.last_scheduled,
            time_slice_micros: (self.time_slice != limits::INFINITE_TIME_SLICE)
                .then(|| self.time_slice.as_micros() as u64),
            parent_pid: self.parent_pid,
            children: self.children.iter().copied().collect(),
            context: self.context,
            exit_code: self.exit_code,
            termination_reason: self.termination_reason,
            waiting_reason: self.waiting_reason,
            wait_start_time: self.wait_start_time,
            segments: self.segments.len(),
            is_kernel: self.is_kernel(),
            is_quantum: self.is_quantum(),
            dispatches: self.dispatches,
        }
    }
}

/// Process snapshot returned by `list_processes` / `get_process_info`
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessInfo {
    pub pid: Pid,
    pub name: String,
    pub state: ProcessState,
    pub priority: Priority,
    pub flags: ProcessFlags,
    pub creation_time: Timestamp,
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    pub execution_time: Duration,
    #[serde(skip_serializing_if = "is_none")]
    pub last_scheduled: Option<Timestamp>,
    /// `None` for an infinite slice
    pub time_slice_micros: Option<u64>,
    #[serde(skip_serializing_if = "is_none")]
    pub parent_pid: Option<Pid>,
    pub children: Vec<Pid>,
    pub context: ProcessContext,
    #[serde(skip_serializing_if = "is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "is_none")]
    pub termination_reason: Option<TerminationReason>,
    #[serde(skip_serializing_if = "is_none")]
    pub waiting_reason: Option<WaitReason>,
    #[serde(skip_serializing_if = "is_none")]
    pub wait_start_time: Option<Timestamp>,
    pub segments: usize,
    #[serde(skip_serializing_if = "is_false")]
    pub is_kernel: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub is_quantum: bool,
    #[serde(skip_serializing_if = "is_zero_u64")]
    pub dispatches: u64,
}

impl ProcessInfo {
    #[inline(always)]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, ProcessState::Running)
    }

    #[inline(always)]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, ProcessState::Ready)
    }

    #[inline(always)]
    pub const fn is_terminated(&self) -> bool {
        matches!(self.state, ProcessState::Terminated)
    }
}
