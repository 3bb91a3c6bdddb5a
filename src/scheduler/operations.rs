/*!
 * Scheduler Core Operations
 * Scheduling decisions, context switches, preemption and voluntary yields
 */

use super::{SchedulerState, SchedulingPolicy};
use crate::core::errors::SchedulerResult;
use crate::core::types::{Pid, Timestamp, IDLE_PID};
use tracing::{debug, info, trace};

impl SchedulerState {
    /// Run one scheduling decision and return the pid holding the CPU afterwards
    pub fn schedule(&mut self) -> SchedulerResult<Pid> {
        let result = self.decide();
        self.track(result)
    }

    fn decide(&mut self) -> SchedulerResult<Pid> {
        self.ensure_initialized()?;
        self.ensure_idle();
        self.counters.scheduling_decisions += 1;
        let now = self.clock.now();

        if let Some(pid) = self.preemption_due(now) {
            return self.preempt(pid, now);
        }

        let next = self.select_at(now);
        if self.table.current() == Some(next) {
            self.renew_expired_slice(next, now);
            return Ok(next);
        }
        self.context_switch(next, now)
    }

    /// Running user process that exceeded the execution limit without yielding
    fn preemption_due(&self, now: Timestamp) -> Option<Pid> {
        let limit = self.config.max_execution_without_yield;
        self.running_user()
            .filter(|p| p.running_for(now) > limit)
            .map(|p| p.pid)
    }

    fn preempt(&mut self, pid: Pid, now: Timestamp) -> SchedulerResult<Pid> {
        match self.best_ready() {
            Some((_, next)) => {
                self.counters.preemptions += 1;
                info!(pid, next, "Preempting process over execution limit");
                self.context_switch(next, now)
            }
            None => {
                trace!(pid, "Execution limit reached with nothing ready");
                self.refresh_slice(pid, now);
                Ok(pid)
            }
        }
    }

    /// A slice-based policy keeping its process because nothing else is ready
    fn renew_expired_slice(&mut self, pid: Pid, now: Timestamp) {
        if !matches!(
            self.policy,
            SchedulingPolicy::RoundRobin | SchedulingPolicy::MultilevelFeedback
        ) {
            return;
        }
        let expired = self
            .running_user()
            .is_some_and(|p| p.pid == pid && p.slice_expired(now));
        if expired {
            self.refresh_slice(pid, now);
        }
    }

    /// Give up the CPU; the best other ready process runs if there is one
    pub fn yield_now(&mut self) -> SchedulerResult<Pid> {
        let result = self.try_yield();
        self.track(result)
    }

    fn try_yield(&mut self) -> SchedulerResult<Pid> {
        self.ensure_initialized()?;
        let Some(pid) = self.running_user().map(|p| p.pid) else {
            return self.decide();
        };

        self.ensure_idle();
        self.counters.scheduling_decisions += 1;
        self.counters.voluntary_yields += 1;
        let now = self.clock.now();

        match self.best_ready() {
            Some((_, next)) => {
                debug!(pid, next, "Process yielded");
                self.context_switch(next, now)
            }
            None => {
                self.redispatch_in_place(pid, now);
                Ok(pid)
            }
        }
    }

    /// Switch the CPU from the current process (if any) to `next`
    pub(crate) fn context_switch(&mut self, next: Pid, now: Timestamp) -> SchedulerResult<Pid> {
        let previous = self.table.current();
        if let Some(prev) = previous {
            self.release_cpu(prev, now);
            self.requeue(prev);
        }

        let slice = self.slice_for(self.process(next)?);
        self.dispatch(next, slice, now)?;

        if let Err(e) = self.memory.activate_memory_map(next) {
            self.warn(Some(next), format!("memory map activation failed: {}", e));
        }
        self.restore_context(next);

        self.counters.context_switches += 1;
        if next == IDLE_PID {
            self.counters.idle_dispatches += 1;
        }
        debug!(from = ?previous, to = next, slice_us = slice.as_micros() as u64, "Context switch");
        Ok(next)
    }

    /// Whether waking `pid` should take the CPU away from the running process
    pub(crate) fn wake_preempts(&self, pid: Pid) -> bool {
        let Some(running) = self.running_user() else {
            return true;
        };
        if !self.policy.is_preemptive() {
            return false;
        }
        let Some(woken) = self.table.get(pid) else {
            return false;
        };

        if self.policy == SchedulingPolicy::QuantumAware {
            let boost = self.config.quantum_boost;
            let effective = |p: &crate::process::Process| {
                if p.is_quantum() {
                    p.priority.boosted(boost)
                } else {
                    p.priority
                }
            };
            effective(woken) > effective(running)
        } else {
            woken.priority > running.priority
        }
    }
}
