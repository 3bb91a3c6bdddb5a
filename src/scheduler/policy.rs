/*!
 * Scheduling Policies
 *
 * Selection of the next process to run. Selection never dequeues: the
 * context switch removes the chosen process from its ready queue. The idle
 * process is only chosen when no user process is eligible.
 */

use super::SchedulerState;
use crate::core::errors::SchedulerResult;
use crate::core::limits::{FEEDBACK_SLICE_STEP, INFINITE_TIME_SLICE};
use crate::core::types::{Pid, Timestamp, IDLE_PID};
use crate::process::{Priority, Process, ProcessState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Scheduling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingPolicy {
    /// Time-sliced rotation, highest non-empty queue first
    #[default]
    #[serde(alias = "rr")]
    RoundRobin,
    /// Strict priority, equal priorities rotate
    #[serde(alias = "strict")]
    Priority,
    /// Multilevel feedback: priority-scaled slices and aging demotion
    #[serde(rename = "mlfq", alias = "multilevel_feedback")]
    MultilevelFeedback,
    /// Strict priority with a boost for quantum workloads
    #[serde(alias = "quantum")]
    QuantumAware,
}

impl SchedulingPolicy {
    pub const ALL: [SchedulingPolicy; 4] = [
        Self::RoundRobin,
        Self::Priority,
        Self::MultilevelFeedback,
        Self::QuantumAware,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::Priority => "priority",
            Self::MultilevelFeedback => "mlfq",
            Self::QuantumAware => "quantum_aware",
        }
    }

    /// Whether a higher-priority wakeup should take the CPU immediately
    pub const fn is_preemptive(&self) -> bool {
        !matches!(self, Self::RoundRobin)
    }
}

impl FromStr for SchedulingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "round_robin" | "roundrobin" | "rr" => Ok(Self::RoundRobin),
            "priority" | "strict" => Ok(Self::Priority),
            "mlfq" | "multilevel_feedback" | "feedback" => Ok(Self::MultilevelFeedback),
            "quantum_aware" | "quantum" => Ok(Self::QuantumAware),
            other => Err(format!("unknown scheduling policy '{}'", other)),
        }
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn raw_priority(process: &Process) -> Priority {
    process.priority
}

impl SchedulerState {
    pub fn policy(&self) -> SchedulingPolicy {
        self.policy
    }

    /// Switch policy; queues are shared by every policy so nothing is requeued
    pub fn set_policy(&mut self, policy: SchedulingPolicy) {
        if policy == self.policy {
            return;
        }
        info!(from = %self.policy, to = %policy, "Scheduling policy changed");
        self.policy = policy;
        self.config.policy = policy;
    }

    /// Pick the process that should hold the CPU next under the active policy
    pub fn select_next_process(&mut self) -> SchedulerResult<Pid> {
        self.ensure_initialized()?;
        self.ensure_idle();
        let now = self.clock.now();
        Ok(self.select_at(now))
    }

    pub(crate) fn select_at(&mut self, now: Timestamp) -> Pid {
        match self.policy {
            SchedulingPolicy::RoundRobin => self.select_round_robin(now),
            SchedulingPolicy::Priority => self.select_by_priority(now, false, raw_priority),
            SchedulingPolicy::MultilevelFeedback => {
                self.age_processes(now);
                self.select_by_priority(now, true, raw_priority)
            }
            SchedulingPolicy::QuantumAware => self.select_quantum_aware(now),
        }
    }

    /// Demote every live process whose execution time crossed the aging threshold
    pub fn run_aging_check(&mut self) -> SchedulerResult<usize> {
        self.ensure_initialized()?;
        let now = self.clock.now();
        Ok(self.age_processes(now))
    }

    fn age_processes(&mut self, now: Timestamp) -> usize {
        let threshold = self.config.aging_threshold;
        let candidates: Vec<(Pid, Priority)> = self
            .table
            .iter()
            .filter(|p| p.is_live() && !p.is_idle() && p.priority > Priority::Low)
            .filter(|p| p.execution_time_at(now) > threshold)
            .filter_map(|p| p.priority.lowered().map(|lower| (p.pid, lower)))
            .collect();

        let mut demoted = 0;
        for (pid, lower) in candidates {
            match self.try_change_priority(pid, lower) {
                Ok(()) => {
                    demoted += 1;
                    self.counters.demotions += 1;
                    info!(pid, to = %lower, "Process aged to lower priority");
                }
                Err(e) => self.warn(Some(pid), format!("aging demotion failed: {}", e)),
            }
        }
        demoted
    }

    /// Running user process, if any
    pub(crate) fn running_user(&self) -> Option<&Process> {
        self.table
            .current_process()
            .filter(|p| !p.is_idle() && p.state == ProcessState::Running)
    }

    /// Best READY user process by `effective` priority, FIFO within a queue
    pub(crate) fn best_ready_by<F>(&self, effective: F) -> Option<(Priority, Pid)>
    where
        F: Fn(&Process) -> Priority,
    {
        let mut best: Option<(Priority, Pid)> = None;
        for (_, queue) in self.queues.ready_descending() {
            for &pid in queue {
                if pid == IDLE_PID {
                    continue;
                }
                let Some(process) = self.table.get(pid) else {
                    continue;
                };
                let priority = effective(process);
                if best.map_or(true, |(top, _)| priority > top) {
                    best = Some((priority, pid));
                }
            }
        }
        best
    }

    pub(crate) fn best_ready(&self) -> Option<(Priority, Pid)> {
        self.best_ready_by(raw_priority)
    }

    /// Keep the running user process, or fall back to idle
    fn keep_or_idle(&self) -> Pid {
        self.running_user().map_or(IDLE_PID, |p| p.pid)
    }

    fn select_round_robin(&self, now: Timestamp) -> Pid {
        if let Some(current) = self.running_user() {
            if !current.slice_expired(now) {
                return current.pid;
            }
        }
        self.best_ready()
            .map(|(_, pid)| pid)
            .unwrap_or_else(|| self.keep_or_idle())
    }

    /// Strict selection; with `honor_slice` an equal-priority contender waits
    /// for the running process's slice to expire
    fn select_by_priority<F>(&self, now: Timestamp, honor_slice: bool, effective: F) -> Pid
    where
        F: Fn(&Process) -> Priority,
    {
        let Some((ready_priority, ready_pid)) = self.best_ready_by(&effective) else {
            return self.keep_or_idle();
        };
        let Some(current) = self.running_user() else {
            return ready_pid;
        };

        let running_priority = effective(current);
        let keep = running_priority > ready_priority
            || (running_priority == ready_priority
                && honor_slice
                && !current.slice_expired(now));
        if keep {
            current.pid
        } else {
            ready_pid
        }
    }

    fn select_quantum_aware(&mut self, now: Timestamp) -> Pid {
        let boost = self.config.quantum_boost;
        let effective = move |p: &Process| {
            if p.is_quantum() {
                p.priority.boosted(boost)
            } else {
                p.priority
            }
        };

        let candidate = self.queues.ready_descending().find_map(|(priority, queue)| {
            queue
                .iter()
                .copied()
                .find(|&pid| {
                    pid != IDLE_PID && self.table.get(pid).is_some_and(Process::is_quantum)
                })
                .map(|pid| (priority, pid))
        });

        if let Some((priority, pid)) = candidate {
            self.promote_to_front(pid);
            let boosted = priority.boosted(boost);
            let classical = self.queues.ready_descending().find_map(|(level, queue)| {
                queue
                    .iter()
                    .any(|&rival| {
                        rival != IDLE_PID
                            && self.table.get(rival).is_some_and(|p| !p.is_quantum())
                    })
                    .then_some(level)
            });
            let running = self.running_user().map(effective);
            let rival = classical.max(running);

            if rival.map_or(true, |r| boosted > r) {
                return pid;
            }
        }

        self.select_by_priority(now, false, effective)
    }

    /// Slice granted to `process` on dispatch
    pub(crate) fn slice_for(&self, process: &Process) -> Duration {
        if process.is_idle() {
            return INFINITE_TIME_SLICE;
        }
        let base = process.base_time_slice;
        match self.policy {
            SchedulingPolicy::MultilevelFeedback => feedback_slice(base, process.priority),
            _ => base,
        }
    }
}

/// Multilevel feedback slice: lower priorities get longer slices
pub fn feedback_slice(base: Duration, priority: Priority) -> Duration {
    let levels_below_top = Priority::Realtime.level() - priority.level();
    let factor = 1.0 + f64::from(levels_below_top) * FEEDBACK_SLICE_STEP;
    Duration::from_nanos((base.as_nanos() as f64 * factor).round() as u64)
}
