/*!
 * Scheduler State
 *
 * The single aggregate owning the process table, the queue manager, the
 * statistics counters and the event log. Lifecycle operations and the
 * scheduling engine are both inherent methods on it, so a single lock around
 * a `SchedulerState` serializes every mutation.
 */

use super::stats::StatsCounters;
use super::SchedulingPolicy;
use crate::core::clock::Clock;
use crate::core::config::SchedulerConfig;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{Pid, Timestamp, IDLE_PID};
use crate::memory::{MemoryCollaborator, QuantumMemory};
use crate::monitoring::{Event, EventLog};
use crate::process::{Process, ProcessInfo, ProcessTable, QueueManager, QueueSnapshot};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SchedulerState {
    pub(crate) table: ProcessTable,
    pub(crate) queues: QueueManager,
    pub(crate) policy: SchedulingPolicy,
    pub(crate) config: SchedulerConfig,
    pub(crate) counters: StatsCounters,
    pub(crate) events: EventLog,
    pub(crate) memory: Arc<dyn MemoryCollaborator>,
    pub(crate) quantum_memory: Option<Arc<dyn QuantumMemory>>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) initialized: bool,
}

impl SchedulerState {
    /// Uninitialized state; call [`SchedulerState::initialize`] before use
    pub fn new(
        config: SchedulerConfig,
        memory: Arc<dyn MemoryCollaborator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            table: ProcessTable::new(),
            queues: QueueManager::new(),
            policy: config.policy,
            config,
            counters: StatsCounters::default(),
            events: EventLog::new(),
            memory,
            quantum_memory: None,
            clock,
            initialized: false,
        }
    }

    #[must_use]
    pub fn with_quantum_memory(mut self, quantum: Arc<dyn QuantumMemory>) -> Self {
        self.quantum_memory = Some(quantum);
        self
    }

    /// Install the idle process and accept operations; idempotent
    pub fn initialize(&mut self) -> SchedulerResult<()> {
        if self.initialized {
            debug!("Scheduler already initialized");
            return Ok(());
        }
        self.config.validate()?;

        let now = self.clock.now();
        self.queues.purge(IDLE_PID);
        self.table.insert(Process::idle(now));
        self.queues.push_ready(crate::process::Priority::Idle, IDLE_PID);
        self.initialized = true;

        info!(
            policy = %self.policy,
            time_slice_ms = self.config.base_time_slice.as_millis() as u64,
            quantum = self.quantum_memory.is_some(),
            "Scheduler initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub(crate) fn ensure_initialized(&self) -> SchedulerResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(SchedulerError::NotInitialized)
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn current_pid(&self) -> Option<Pid> {
        self.table.current()
    }

    pub fn get_process_info(&self, pid: Pid) -> SchedulerResult<ProcessInfo> {
        self.ensure_initialized()?;
        self.process(pid).map(Process::info)
    }

    /// Every process in the table, ordered by pid
    pub fn list_processes(&self) -> Vec<ProcessInfo> {
        let mut processes: Vec<ProcessInfo> = self.table.iter().map(Process::info).collect();
        processes.sort_by_key(|p| p.pid);
        processes
    }

    pub fn queue_snapshot(&self) -> QueueSnapshot {
        self.queues.snapshot()
    }

    /// Retained error events, oldest first
    pub fn errors(&self) -> Vec<Event> {
        self.events.errors()
    }

    /// Retained warning events, oldest first
    pub fn warnings(&self) -> Vec<Event> {
        self.events.warnings()
    }

    /// Record a failed operation before handing the result back
    pub(crate) fn track<T>(&mut self, result: SchedulerResult<T>) -> SchedulerResult<T> {
        if let Err(ref e) = result {
            warn!(kind = e.kind().as_str(), pid = ?e.pid(), "{}", e);
            let now = self.clock.now();
            self.events.record_error(now, e);
        }
        result
    }

    pub(crate) fn warn(&mut self, pid: Option<Pid>, message: impl Into<String>) {
        let message = message.into();
        warn!(?pid, "{}", message);
        let now = self.clock.now();
        self.events.record_warning(now, pid, message);
    }
}

impl fmt::Debug for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerState")
            .field("policy", &self.policy)
            .field("initialized", &self.initialized)
            .field("processes", &self.table.len())
            .field("current", &self.table.current())
            .field("events", &self.events)
            .finish()
    }
}
