/*!
 * Scheduler Statistics
 * Counters maintained by the engine and the snapshot handed to callers
 */

use super::{SchedulerState, SchedulingPolicy};
use crate::core::serde::DurationMicroSeconds;
use crate::core::types::Pid;
use crate::process::ProcessState;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub(crate) struct StatsCounters {
    pub context_switches: u64,
    pub preemptions: u64,
    pub voluntary_yields: u64,
    pub scheduling_decisions: u64,
    pub idle_dispatches: u64,
    pub idle_recreations: u64,
    pub demotions: u64,
    pub total_wait_time: Duration,
    pub processes_waited: u64,
}

impl StatsCounters {
    pub fn record_wait(&mut self, waited: Duration) {
        self.total_wait_time += waited;
        self.processes_waited += 1;
    }

    pub fn average_wait_time(&self) -> Duration {
        if self.processes_waited == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_wait_time.as_nanos() / u128::from(self.processes_waited);
        Duration::from_nanos(nanos as u64)
    }
}

/// Scheduler statistics snapshot
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SchedulerStats {
    pub policy: SchedulingPolicy,
    pub current_pid: Option<Pid>,
    pub context_switches: u64,
    pub preemptions: u64,
    pub voluntary_yields: u64,
    pub scheduling_decisions: u64,
    pub idle_dispatches: u64,
    pub idle_recreations: u64,
    pub demotions: u64,
    pub dropped_ticks: u64,
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    pub total_wait_time: Duration,
    pub processes_waited: u64,
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    pub average_wait_time: Duration,
    pub total_processes: usize,
    pub live_processes: usize,
    pub ready_processes: usize,
    pub waiting_processes: usize,
    pub errors_recorded: u64,
    pub warnings_recorded: u64,
}

impl SchedulerStats {
    /// Share of switches forced by the preemption guard
    pub fn preemption_ratio(&self) -> f64 {
        if self.context_switches == 0 {
            0.0
        } else {
            self.preemptions as f64 / self.context_switches as f64
        }
    }
}

impl SchedulerState {
    /// Statistics snapshot
    pub fn get_statistics(&self) -> SchedulerStats {
        let counters = &self.counters;
        SchedulerStats {
            policy: self.policy,
            current_pid: self.table.current(),
            context_switches: counters.context_switches,
            preemptions: counters.preemptions,
            voluntary_yields: counters.voluntary_yields,
            scheduling_decisions: counters.scheduling_decisions,
            idle_dispatches: counters.idle_dispatches,
            idle_recreations: counters.idle_recreations,
            demotions: counters.demotions,
            dropped_ticks: 0,
            total_wait_time: counters.total_wait_time,
            processes_waited: counters.processes_waited,
            average_wait_time: counters.average_wait_time(),
            total_processes: self.table.len(),
            live_processes: self.table.live_count(),
            ready_processes: self.queues.ready_len(),
            waiting_processes: self
                .table
                .iter()
                .filter(|p| p.state == ProcessState::Waiting)
                .count(),
            errors_recorded: self.events.total_errors(),
            warnings_recorded: self.events.total_warnings(),
        }
    }
}
