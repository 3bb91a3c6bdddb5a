/*!
 * Scheduler Handle
 *
 * Shared, thread-safe front end over a [`SchedulerState`]. Lifecycle calls
 * serialize on the state lock and trigger the scheduling decisions the
 * lifecycle requires. Timer ticks never wait: a tick that finds a decision
 * already in flight is dropped and counted.
 */

use super::{SchedulerBuilder, SchedulerState, SchedulerStats, SchedulingPolicy};
use crate::core::errors::SchedulerResult;
use crate::core::guard::SwitchGuard;
use crate::core::types::Pid;
use crate::monitoring::Event;
use crate::process::{
    Priority, ProcessInfo, ProcessSpec, QueueSnapshot, TerminationReason, WaitReason,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Result of a timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "pid")]
pub enum TickOutcome {
    /// A decision ran; the pid holds the CPU
    Dispatched(Pid),
    /// Another decision was in progress
    Dropped,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    state: Arc<Mutex<SchedulerState>>,
    switching: Arc<AtomicBool>,
    dropped_ticks: Arc<AtomicU64>,
}

impl Scheduler {
    pub fn new(state: SchedulerState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            switching: Arc::new(AtomicBool::new(false)),
            dropped_ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub fn initialize(&self) -> SchedulerResult<()> {
        self.state.lock().initialize()
    }

    /// Timer entry point; never blocks
    pub fn tick(&self) -> SchedulerResult<TickOutcome> {
        let Some(_switch) = SwitchGuard::try_acquire(&self.switching) else {
            return Ok(self.drop_tick());
        };
        let Some(mut state) = self.state.try_lock() else {
            return Ok(self.drop_tick());
        };
        state.schedule().map(TickOutcome::Dispatched)
    }

    fn drop_tick(&self) -> TickOutcome {
        let dropped = self.dropped_ticks.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(dropped, "Tick dropped, decision already in progress");
        TickOutcome::Dropped
    }

    pub fn dropped_ticks(&self) -> u64 {
        self.dropped_ticks.load(Ordering::Relaxed)
    }

    /// Whether a scheduling decision is in flight
    pub fn is_switching(&self) -> bool {
        SwitchGuard::is_held(&self.switching)
    }

    /// Run `f` under the state lock, marking a decision in flight
    fn decide<R>(
        &self,
        f: impl FnOnce(&mut SchedulerState) -> SchedulerResult<R>,
    ) -> SchedulerResult<R> {
        let mut state = self.state.lock();
        let _switch = SwitchGuard::try_acquire(&self.switching);
        f(&mut *state)
    }

    /// Reschedule when no user process holds the CPU any more
    fn settle(state: &mut SchedulerState) -> SchedulerResult<()> {
        if state.running_user().is_none() {
            state.schedule()?;
        }
        Ok(())
    }

    pub fn create(&self, spec: ProcessSpec) -> SchedulerResult<Pid> {
        self.state.lock().create(spec)
    }

    pub fn terminate(
        &self,
        pid: Pid,
        exit_code: i32,
        reason: TerminationReason,
    ) -> SchedulerResult<()> {
        self.decide(|state| {
            state.terminate(pid, exit_code, reason)?;
            Self::settle(state)
        })
    }

    pub fn block(
        &self,
        pid: Pid,
        reason: WaitReason,
        wait_data: Option<u64>,
    ) -> SchedulerResult<()> {
        self.decide(|state| {
            state.block(pid, reason, wait_data)?;
            Self::settle(state)
        })
    }

    pub fn block_named(
        &self,
        pid: Pid,
        reason: &str,
        wait_data: Option<u64>,
    ) -> SchedulerResult<()> {
        self.decide(|state| {
            state.block_named(pid, reason, wait_data)?;
            Self::settle(state)
        })
    }

    /// Wake `pid`; it takes the CPU at once when it outranks the running process
    pub fn unblock(&self, pid: Pid) -> SchedulerResult<()> {
        self.decide(|state| {
            state.unblock(pid)?;
            if state.wake_preempts(pid) {
                state.schedule()?;
            }
            Ok(())
        })
    }

    pub fn yield_now(&self) -> SchedulerResult<Pid> {
        self.decide(SchedulerState::yield_now)
    }

    pub fn schedule(&self) -> SchedulerResult<Pid> {
        self.decide(SchedulerState::schedule)
    }

    pub fn change_priority(&self, pid: Pid, priority: Priority) -> SchedulerResult<()> {
        self.state.lock().change_priority(pid, priority)
    }

    pub fn set_priority_level(&self, pid: Pid, level: u8) -> SchedulerResult<()> {
        self.state.lock().set_priority_level(pid, level)
    }

    pub fn resume(&self, pid: Pid) -> SchedulerResult<()> {
        self.state.lock().resume(pid)
    }

    pub fn reap(&self, pid: Pid) -> SchedulerResult<ProcessInfo> {
        self.state.lock().reap(pid)
    }

    pub fn set_context(&self, pid: Pid, token: u64) -> SchedulerResult<()> {
        self.state.lock().set_context(pid, token)
    }

    pub fn policy(&self) -> SchedulingPolicy {
        self.state.lock().policy()
    }

    pub fn set_policy(&self, policy: SchedulingPolicy) {
        self.state.lock().set_policy(policy);
    }

    pub fn run_aging_check(&self) -> SchedulerResult<usize> {
        self.state.lock().run_aging_check()
    }

    pub fn shutdown(&self) -> SchedulerResult<usize> {
        self.decide(SchedulerState::shutdown)
    }

    pub fn current_pid(&self) -> Option<Pid> {
        self.state.lock().current_pid()
    }

    pub fn get_process_info(&self, pid: Pid) -> SchedulerResult<ProcessInfo> {
        self.state.lock().get_process_info(pid)
    }

    pub fn list_processes(&self) -> Vec<ProcessInfo> {
        self.state.lock().list_processes()
    }

    pub fn queue_snapshot(&self) -> QueueSnapshot {
        self.state.lock().queue_snapshot()
    }

    pub fn get_statistics(&self) -> SchedulerStats {
        let mut stats = self.state.lock().get_statistics();
        stats.dropped_ticks = self.dropped_ticks();
        stats
    }

    pub fn errors(&self) -> Vec<Event> {
        self.state.lock().errors()
    }

    pub fn warnings(&self) -> Vec<Event> {
        self.state.lock().warnings()
    }

    pub fn check_invariants(&self) -> Result<(), Vec<String>> {
        self.state.lock().check_invariants()
    }

    /// Read access to the whole state under the lock
    pub fn inspect<R>(&self, f: impl FnOnce(&SchedulerState) -> R) -> R {
        let state = self.state.lock();
        f(&*state)
    }
}
