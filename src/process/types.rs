/*!
 * Process Types
 * Common types for process lifecycle management
 */

use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::Timestamp;
use crate::memory::SegmentRequest;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Process state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Created suspended, not yet eligible to run
    Created,
    /// Queued in its priority's ready queue
    Ready,
    /// Holding the CPU
    Running,
    /// Parked in a waiting queue
    Waiting,
    /// Terminal
    Terminated,
}

impl ProcessState {
    #[inline(always)]
    pub const fn is_live(&self) -> bool {
        !matches!(self, Self::Terminated)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Ready => "ready",
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheduling priority, higher runs first
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Idle = 0,
    Low = 1,
    Normal = 2,
    High = 3,
    Realtime = 4,
}

impl Priority {
    /// Number of priority levels (and ready queues)
    pub const COUNT: usize = 5;

    /// Every level, highest first
    pub const DESCENDING: [Priority; Self::COUNT] = [
        Priority::Realtime,
        Priority::High,
        Priority::Normal,
        Priority::Low,
        Priority::Idle,
    ];

    #[inline(always)]
    pub const fn level(self) -> u8 {
        self as u8
    }

    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Parse a raw level
    pub fn from_level(level: u8) -> SchedulerResult<Self> {
        match level {
            0 => Ok(Self::Idle),
            1 => Ok(Self::Low),
            2 => Ok(Self::Normal),
            3 => Ok(Self::High),
            4 => Ok(Self::Realtime),
            _ => Err(SchedulerError::InvalidArgument(format!(
                "priority {} outside 0..=4",
                level
            ))),
        }
    }

    /// Raise by `levels`, capped at realtime
    #[must_use]
    pub fn boosted(self, levels: u8) -> Self {
        let level = self.level().saturating_add(levels).min(Self::Realtime.level());
        Self::from_level(level).unwrap_or(Self::Realtime)
    }

    /// One level lower, `None` at idle
    #[must_use]
    pub fn lowered(self) -> Option<Self> {
        match self {
            Self::Idle => None,
            other => Self::from_level(other.level() - 1).ok(),
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Realtime => "realtime",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Normal
    }
}

impl TryFrom<u8> for Priority {
    type Error = SchedulerError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::from_level(level)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// Creation and classification flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ProcessFlags: u16 {
        const KERNEL = 1 << 0;
        const QUANTUM = 1 << 1;
        const DETACHED = 1 << 2;
        const SUSPENDED = 1 << 3;
        const ISOLATED = 1 << 4;
        /// Create at HIGH priority
        const HIGH_PRIORITY = 1 << 5;
        /// Create at REALTIME priority
        const REALTIME = 1 << 6;
    }
}

/// Why a process is parked in a waiting queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitReason {
    Io,
    Lock,
    Sleep,
    Quantum,
    Child,
    Event,
    Other,
}

impl WaitReason {
    /// Number of waiting queues
    pub const COUNT: usize = 7;

    pub const ALL: [WaitReason; Self::COUNT] = [
        WaitReason::Io,
        WaitReason::Lock,
        WaitReason::Sleep,
        WaitReason::Quantum,
        WaitReason::Child,
        WaitReason::Event,
        WaitReason::Other,
    ];

    #[inline(always)]
    pub const fn index(self) -> usize {
        match self {
            Self::Io => 0,
            Self::Lock => 1,
            Self::Sleep => 2,
            Self::Quantum => 3,
            Self::Child => 4,
            Self::Event => 5,
            Self::Other => 6,
        }
    }

    /// Look up a reason by name, `None` when outside the closed set
    pub fn recognize(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "IO" => Some(Self::Io),
            "LOCK" => Some(Self::Lock),
            "SLEEP" => Some(Self::Sleep),
            "QUANTUM" => Some(Self::Quantum),
            "CHILD" => Some(Self::Child),
            "EVENT" => Some(Self::Event),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Io => "IO",
            Self::Lock => "LOCK",
            Self::Sleep => "SLEEP",
            Self::Quantum => "QUANTUM",
            Self::Child => "CHILD",
            Self::Event => "EVENT",
            Self::Other => "OTHER",
        }
    }
}

/// Unknown names coerce to `Other`
impl From<&str> for WaitReason {
    fn from(name: &str) -> Self {
        Self::recognize(name).unwrap_or(Self::Other)
    }
}

impl FromStr for WaitReason {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for WaitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Normal,
    Killed,
    Fault,
    ParentTerminated,
    Shutdown,
}

/// Opaque saved execution context
///
/// Stands in for the register file; the core only captures and restores it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessContext {
    /// Caller-owned payload
    pub token: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<Timestamp>,
    pub saves: u64,
    pub restores: u64,
}

impl ProcessContext {
    pub fn capture(&mut self, now: Timestamp) {
        self.saved_at = Some(now);
        self.saves += 1;
    }

    pub fn restore(&mut self) {
        self.restores += 1;
    }
}

/// Process creation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub name: String,
    pub flags: ProcessFlags,
    /// Base priority, creation flags override it
    pub priority: Option<Priority>,
    pub segments: Vec<SegmentRequest>,
    /// Quantum registers for QUANTUM workloads
    pub quantum_registers: usize,
    pub time_slice: Option<Duration>,
}

impl ProcessSpec {
    /// Spec with the default code/data/stack layout
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: ProcessFlags::empty(),
            priority: None,
            segments: SegmentRequest::default_layout(),
            quantum_registers: crate::core::limits::DEFAULT_QUANTUM_REGISTERS,
            time_slice: None,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: ProcessFlags) -> Self {
        self.flags |= flags;
        self
    }

    #[must_use]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn with_segments(mut self, segments: Vec<SegmentRequest>) -> Self {
        self.segments = segments;
        self
    }

    /// No address-space segments (kernel threads)
    #[must_use]
    pub fn without_segments(mut self) -> Self {
        self.segments.clear();
        self
    }

    #[must_use]
    pub fn quantum(mut self, registers: usize) -> Self {
        self.flags |= ProcessFlags::QUANTUM;
        self.quantum_registers = registers;
        self
    }

    #[must_use]
    pub fn suspended(mut self) -> Self {
        self.flags |= ProcessFlags::SUSPENDED;
        self
    }

    #[must_use]
    pub fn with_time_slice(mut self, slice: Duration) -> Self {
        self.time_slice = Some(slice);
        self
    }

    /// Priority after applying creation flags
    pub fn effective_priority(&self) -> Priority {
        if self.flags.contains(ProcessFlags::REALTIME) {
            Priority::Realtime
        } else if self.flags.contains(ProcessFlags::HIGH_PRIORITY) {
            Priority::High
        } else {
            self.priority.unwrap_or_default()
        }
    }

    pub fn wants_quantum(&self) -> bool {
        self.flags.contains(ProcessFlags::QUANTUM)
    }
}
