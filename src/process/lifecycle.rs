/*!
 * Process Lifecycle
 *
 * Creation, termination, blocking, unblocking and re-prioritization of
 * processes, plus the dispatch primitives the scheduling engine builds on.
 * Every transition here keeps the process table and the queue manager in
 * step: a READY process sits in exactly one ready queue, a WAITING process in
 * exactly one waiting queue, and nothing else is queued anywhere.
 */

use super::descriptor::{Process, ProcessInfo};
use super::types::*;
use super::validation::ensure_transition;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::limits::{PARENT_TERMINATED_EXIT_CODE, SHUTDOWN_EXIT_CODE};
use crate::core::types::{elapsed_between, Pid, Timestamp, IDLE_PID};
use crate::memory::{QuantumSegment, SegmentGrant};
use crate::scheduler::SchedulerState;
use std::time::Duration;
use tracing::{debug, info};

impl SchedulerState {
    /// Create a process from `spec` and make it READY (or CREATED if suspended)
    ///
    /// A pid is consumed even when creation fails. Segment allocation is all
    /// or nothing; quantum registers are best effort and a refusal leaves the
    /// process running without the QUANTUM flag.
    pub fn create(&mut self, spec: ProcessSpec) -> SchedulerResult<Pid> {
        let result = self.try_create(spec);
        self.track(result)
    }

    fn try_create(&mut self, spec: ProcessSpec) -> SchedulerResult<Pid> {
        self.ensure_initialized()?;
        if spec.name.trim().is_empty() {
            return Err(SchedulerError::InvalidArgument(
                "process name cannot be empty".into(),
            ));
        }

        let now = self.clock.now();
        let pid = self.table.allocate_pid()?;
        let priority = spec.effective_priority();
        let wants_quantum = spec.wants_quantum();

        let mut grant = SegmentGrant::new(pid, self.memory.clone());
        if let Err(e) = grant.allocate_all(&spec.segments) {
            return Err(SchedulerError::ResourceExhausted(format!(
                "segment allocation for process {} ({}) failed: {}",
                pid, spec.name, e
            )));
        }

        let mut process = Process::new(pid, spec.name, priority, now);
        process.flags = spec.flags;
        process.segments = grant.commit();

        let slice = spec.time_slice.unwrap_or(self.config.base_time_slice);
        process.time_slice = slice;
        process.base_time_slice = slice;

        if wants_quantum {
            match self.grant_quantum_registers(pid, spec.quantum_registers) {
                Some(segment) => process.quantum_segment = Some(segment),
                None => process.flags.remove(ProcessFlags::QUANTUM),
            }
        }

        if !spec.flags.contains(ProcessFlags::DETACHED) {
            if let Some(parent_pid) = self.table.current().filter(|&p| p != IDLE_PID) {
                if let Some(parent) = self.table.get_mut(parent_pid) {
                    parent.children.insert(pid);
                    process.parent_pid = Some(parent_pid);
                }
            }
        }

        if spec.flags.contains(ProcessFlags::SUSPENDED) {
            process.state = ProcessState::Created;
        } else {
            process.state = ProcessState::Ready;
            self.queues.push_ready(priority, pid);
        }

        info!(
            pid,
            name = %process.name,
            priority = %priority,
            quantum = process.is_quantum(),
            segments = process.segments.len(),
            "Process created"
        );
        self.table.insert(process);
        Ok(pid)
    }

    fn grant_quantum_registers(&mut self, pid: Pid, registers: usize) -> Option<QuantumSegment> {
        let Some(quantum) = self.quantum_memory.clone() else {
            self.warn(
                Some(pid),
                "no quantum memory available, process runs in non-quantum mode",
            );
            return None;
        };

        match quantum.allocate_registers(pid, registers) {
            Ok(segment) => Some(segment),
            Err(e) => {
                self.warn(
                    Some(pid),
                    format!(
                        "quantum register allocation failed ({}), process runs in non-quantum mode",
                        e
                    ),
                );
                None
            }
        }
    }

    /// Terminate `pid` and, recursively, all of its live children
    ///
    /// Terminating an already terminated process succeeds without effect.
    pub fn terminate(
        &mut self,
        pid: Pid,
        exit_code: i32,
        reason: TerminationReason,
    ) -> SchedulerResult<()> {
        let result = self.try_terminate(pid, exit_code, reason);
        self.track(result)
    }

    fn try_terminate(
        &mut self,
        pid: Pid,
        exit_code: i32,
        reason: TerminationReason,
    ) -> SchedulerResult<()> {
        self.ensure_initialized()?;
        let state = self.process(pid)?.state;
        if state == ProcessState::Terminated {
            debug!(pid, "Process already terminated");
            return Ok(());
        }

        let now = self.clock.now();
        if self.table.current() == Some(pid) {
            self.release_cpu(pid, now);
        }
        self.queues.purge(pid);

        let (children, parent_pid, segments, quantum) = {
            let process = self.process_mut(pid)?;
            process.state = ProcessState::Terminated;
            process.exit_code = Some(exit_code);
            process.termination_reason = Some(reason);
            process.waiting_reason = None;
            process.wait_data = None;
            process.wait_start_time = None;
            (
                process.children.iter().copied().collect::<Vec<_>>(),
                process.parent_pid,
                std::mem::take(&mut process.segments),
                process.quantum_segment.take(),
            )
        };

        for child in children {
            let live = self.table.get(child).is_some_and(Process::is_live);
            if live {
                if let Err(e) = self.try_terminate(
                    child,
                    PARENT_TERMINATED_EXIT_CODE,
                    TerminationReason::ParentTerminated,
                ) {
                    self.warn(
                        Some(child),
                        format!("failed to terminate child of {}: {}", pid, e),
                    );
                }
            }
        }

        for segment in segments {
            if let Err(e) = self.memory.free_segment(segment.base) {
                self.warn(
                    Some(pid),
                    format!("failed to free segment at {:#x}: {}", segment.base, e),
                );
            }
        }
        if quantum.is_some() {
            let released = self
                .quantum_memory
                .as_ref()
                .map(|q| q.free_registers(pid));
            if let Some(Err(e)) = released {
                self.warn(Some(pid), format!("failed to free quantum registers: {}", e));
            }
        }

        if let Some(parent_pid) = parent_pid {
            let wake_parent = match self.table.get_mut(parent_pid) {
                Some(parent) => {
                    parent.children.remove(&pid);
                    parent.state == ProcessState::Waiting
                        && parent.waiting_reason == Some(WaitReason::Child)
                        && parent.wait_data == Some(u64::from(pid))
                }
                None => false,
            };
            if wake_parent {
                debug!(pid, parent = parent_pid, "Waking parent waiting on child");
                self.try_unblock(parent_pid)?;
            }
        }

        info!(pid, exit_code, reason = ?reason, "Process terminated");
        Ok(())
    }

    /// Move a READY or RUNNING process onto the waiting queue for `reason`
    pub fn block(
        &mut self,
        pid: Pid,
        reason: WaitReason,
        wait_data: Option<u64>,
    ) -> SchedulerResult<()> {
        let result = self.try_block(pid, reason, wait_data);
        self.track(result)
    }

    /// Block using a textual reason; unrecognized names become OTHER
    pub fn block_named(
        &mut self,
        pid: Pid,
        reason: &str,
        wait_data: Option<u64>,
    ) -> SchedulerResult<()> {
        let reason = match WaitReason::recognize(reason) {
            Some(known) => known,
            None => {
                self.warn(
                    Some(pid),
                    format!("unknown wait reason '{}', treating as OTHER", reason),
                );
                WaitReason::Other
            }
        };
        self.block(pid, reason, wait_data)
    }

    fn try_block(
        &mut self,
        pid: Pid,
        reason: WaitReason,
        wait_data: Option<u64>,
    ) -> SchedulerResult<()> {
        self.ensure_initialized()?;
        if pid == IDLE_PID {
            return Err(SchedulerError::InvalidArgument(
                "the idle process cannot block".into(),
            ));
        }

        let (state, priority) = {
            let process = self.process(pid)?;
            (process.state, process.priority)
        };
        ensure_transition(pid, state, ProcessState::Waiting, "block")?;

        let now = self.clock.now();
        match state {
            ProcessState::Ready => {
                self.queues.remove_ready(priority, pid);
            }
            _ => self.release_cpu(pid, now),
        }

        let process = self.process_mut(pid)?;
        process.state = ProcessState::Waiting;
        process.waiting_reason = Some(reason);
        process.wait_data = wait_data;
        process.wait_start_time = Some(now);
        self.queues.push_waiting(reason, pid);

        debug!(pid, reason = %reason, ?wait_data, "Process blocked");
        Ok(())
    }

    /// Return a WAITING process to the tail of its ready queue
    pub fn unblock(&mut self, pid: Pid) -> SchedulerResult<()> {
        let result = self.try_unblock(pid);
        self.track(result)
    }

    fn try_unblock(&mut self, pid: Pid) -> SchedulerResult<()> {
        self.ensure_initialized()?;
        let now = self.clock.now();

        let process = self.process_mut(pid)?;
        if process.state != ProcessState::Waiting {
            return Err(SchedulerError::invalid_state(pid, process.state, "unblock"));
        }

        let reason = process.waiting_reason.take().unwrap_or(WaitReason::Other);
        let waited = process
            .wait_start_time
            .take()
            .map(|start| elapsed_between(start, now))
            .unwrap_or_default();
        process.wait_data = None;
        process.state = ProcessState::Ready;
        let priority = process.priority;

        self.queues.remove_waiting(reason, pid);
        self.queues.push_ready(priority, pid);
        self.counters.record_wait(waited);

        debug!(pid, reason = %reason, waited_us = waited.as_micros() as u64, "Process unblocked");
        Ok(())
    }

    /// Change the priority of a live process, requeueing it if READY
    pub fn change_priority(&mut self, pid: Pid, priority: Priority) -> SchedulerResult<()> {
        let result = self.try_change_priority(pid, priority);
        self.track(result)
    }

    /// Change priority from a raw level (0..=4)
    pub fn set_priority_level(&mut self, pid: Pid, level: u8) -> SchedulerResult<()> {
        let result = Priority::from_level(level).and_then(|p| self.try_change_priority(pid, p));
        self.track(result)
    }

    pub(crate) fn try_change_priority(
        &mut self,
        pid: Pid,
        priority: Priority,
    ) -> SchedulerResult<()> {
        self.ensure_initialized()?;
        if pid == IDLE_PID {
            return Err(SchedulerError::InvalidArgument(
                "the idle process priority is fixed".into(),
            ));
        }

        let process = self.process_mut(pid)?;
        if process.state == ProcessState::Terminated {
            return Err(SchedulerError::invalid_state(
                pid,
                process.state,
                "change priority of",
            ));
        }
        let previous = process.priority;
        if previous == priority {
            return Ok(());
        }
        process.priority = priority;

        if process.state == ProcessState::Ready {
            self.queues.remove_ready(previous, pid);
            self.queues.push_ready(priority, pid);
        }

        debug!(pid, from = %previous, to = %priority, "Priority changed");
        Ok(())
    }

    /// Release a process created with the SUSPENDED flag
    pub fn resume(&mut self, pid: Pid) -> SchedulerResult<()> {
        let result = self.try_resume(pid);
        self.track(result)
    }

    fn try_resume(&mut self, pid: Pid) -> SchedulerResult<()> {
        self.ensure_initialized()?;
        let process = self.process_mut(pid)?;
        if process.state != ProcessState::Created {
            return Err(SchedulerError::invalid_state(pid, process.state, "resume"));
        }
        process.state = ProcessState::Ready;
        process.flags.remove(ProcessFlags::SUSPENDED);
        let priority = process.priority;
        self.queues.push_ready(priority, pid);

        debug!(pid, "Process resumed");
        Ok(())
    }

    /// Remove a terminated process from the table, returning its final snapshot
    pub fn reap(&mut self, pid: Pid) -> SchedulerResult<ProcessInfo> {
        let result = self.try_reap(pid);
        self.track(result)
    }

    fn try_reap(&mut self, pid: Pid) -> SchedulerResult<ProcessInfo> {
        self.ensure_initialized()?;
        let state = self.process(pid)?.state;
        if state != ProcessState::Terminated {
            return Err(SchedulerError::invalid_state(pid, state, "reap"));
        }
        let process = self.table.remove(pid).ok_or(SchedulerError::NotFound(pid))?;
        debug!(pid, "Process reaped");
        Ok(process.info())
    }

    /// Attach an opaque context token saved and restored on context switches
    pub fn set_context(&mut self, pid: Pid, token: u64) -> SchedulerResult<()> {
        let result = self.process_mut(pid).map(|p| p.context.token = token);
        self.track(result)
    }

    /// Terminate every live user process and leave the scheduler uninitialized
    pub fn shutdown(&mut self) -> SchedulerResult<usize> {
        let result = self.try_shutdown();
        self.track(result)
    }

    fn try_shutdown(&mut self) -> SchedulerResult<usize> {
        self.ensure_initialized()?;
        let roots: Vec<Pid> = self
            .table
            .iter()
            .filter(|p| p.is_live() && !p.is_idle())
            .filter(|p| {
                p.parent_pid
                    .and_then(|parent| self.table.get(parent))
                    .map_or(true, |parent| !parent.is_live())
            })
            .map(|p| p.pid)
            .collect();

        let before = self.table.live_count();
        for pid in roots {
            self.try_terminate(pid, SHUTDOWN_EXIT_CODE, TerminationReason::Shutdown)?;
        }
        let terminated = before - self.table.live_count();

        if let Some(pid) = self.table.current() {
            let now = self.clock.now();
            self.release_cpu(pid, now);
            self.requeue(pid);
        }
        self.initialized = false;
        info!(terminated, "Scheduler shut down");
        Ok(terminated)
    }

    // Engine primitives

    /// Recreate the idle process if it is missing or terminated
    pub(crate) fn ensure_idle(&mut self) -> bool {
        let healthy = self.table.get(IDLE_PID).is_some_and(Process::is_live);
        if healthy {
            return false;
        }

        let now = self.clock.now();
        self.queues.purge(IDLE_PID);
        if self.table.current() == Some(IDLE_PID) {
            self.table.clear_current();
        }
        self.table.insert(Process::idle(now));
        self.queues.push_ready(Priority::Idle, IDLE_PID);
        self.counters.idle_recreations += 1;
        self.warn(Some(IDLE_PID), "idle process was missing, recreated");
        true
    }

    /// Make a READY process the running one with the given slice
    pub(crate) fn dispatch(
        &mut self,
        pid: Pid,
        slice: Duration,
        now: Timestamp,
    ) -> SchedulerResult<()> {
        let process = self.process_mut(pid)?;
        ensure_transition(pid, process.state, ProcessState::Running, "dispatch")?;
        process.state = ProcessState::Running;
        process.mark_dispatched(now);
        process.time_slice = slice;
        process.dispatches += 1;
        let priority = process.priority;

        self.queues.remove_ready(priority, pid);
        self.table.set_current(pid);
        Ok(())
    }

    /// Charge the running time of `pid`, save its context and clear it as current
    pub(crate) fn release_cpu(&mut self, pid: Pid, now: Timestamp) {
        if let Some(process) = self.table.get_mut(pid) {
            process.charge(now);
            process.context.capture(now);
        }
        if self.table.current() == Some(pid) {
            self.table.clear_current();
        }
    }

    /// Put a preempted process back at the tail of its ready queue
    pub(crate) fn requeue(&mut self, pid: Pid) {
        let Some(process) = self.table.get_mut(pid) else {
            return;
        };
        if process.state != ProcessState::Running {
            return;
        }
        process.state = ProcessState::Ready;
        let priority = process.priority;
        self.queues.push_ready(priority, pid);
    }

    pub(crate) fn restore_context(&mut self, pid: Pid) {
        if let Some(process) = self.table.get_mut(pid) {
            process.context.restore();
        }
    }

    /// Move a READY process to the head of its queue
    pub(crate) fn promote_to_front(&mut self, pid: Pid) -> bool {
        match self.table.get(pid) {
            Some(p) if p.state == ProcessState::Ready => {
                self.queues.move_to_front(p.priority, pid)
            }
            _ => false,
        }
    }

    /// Charge elapsed time and start a fresh slice without switching.
    /// The dispatch stamp is untouched, so the execution limit keeps counting.
    pub(crate) fn refresh_slice(&mut self, pid: Pid, now: Timestamp) {
        if let Some(process) = self.table.get_mut(pid) {
            if process.state == ProcessState::Running {
                process.charge(now);
                process.slice_started = Some(now);
            }
        }
    }

    /// A yield with nothing else ready: the process is dispatched again in place
    pub(crate) fn redispatch_in_place(&mut self, pid: Pid, now: Timestamp) {
        if let Some(process) = self.table.get_mut(pid) {
            if process.state == ProcessState::Running {
                process.charge(now);
                process.mark_dispatched(now);
            }
        }
    }

    pub(crate) fn process(&self, pid: Pid) -> SchedulerResult<&Process> {
        self.table.get(pid).ok_or(SchedulerError::NotFound(pid))
    }

    pub(crate) fn process_mut(&mut self, pid: Pid) -> SchedulerResult<&mut Process> {
        self.table.get_mut(pid).ok_or(SchedulerError::NotFound(pid))
    }
}
