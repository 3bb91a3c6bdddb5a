/*!
 * Policy Tests
 * Selection behaviour of each scheduling policy
 */

use crate::common::Harness;
use ai_os_sched::{
    Priority, ProcessSpec, ProcessState, SchedulingPolicy, TerminationReason, IDLE_PID,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_strict_priority_runs_highest_first() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let _low = h.spawn("low", Priority::Low);
    let normal = h.spawn("normal", Priority::Normal);
    let high = h.spawn("high", Priority::High);

    assert_eq!(h.state.schedule().unwrap(), high);

    h.state.terminate(high, 0, TerminationReason::Normal).unwrap();
    assert_eq!(h.state.current_pid(), None);
    assert_eq!(h.state.schedule().unwrap(), normal);
    h.assert_consistent();
}

#[test]
fn test_strict_priority_rotates_equal_priorities() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let a = h.spawn("a", Priority::Normal);
    let b = h.spawn("b", Priority::Normal);

    assert_eq!(h.state.schedule().unwrap(), a);
    assert_eq!(h.state.schedule().unwrap(), b);
    assert_eq!(h.state.schedule().unwrap(), a);
    h.assert_consistent();
}

#[test]
fn test_strict_priority_keeps_higher_running_process() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let high = h.spawn("high", Priority::High);
    h.spawn("low", Priority::Low);

    assert_eq!(h.state.schedule().unwrap(), high);
    h.clock.advance(Duration::from_millis(50));
    assert_eq!(h.state.schedule().unwrap(), high);
    assert_eq!(h.state.get_statistics().context_switches, 1);
}

#[test]
fn test_round_robin_dispatches_every_process_within_n_decisions() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let pids: Vec<_> = (0..5)
        .map(|i| h.spawn(&format!("rr-{}", i), Priority::Normal))
        .collect();

    let mut dispatched = Vec::new();
    for _ in 0..pids.len() {
        dispatched.push(h.state.schedule().unwrap());
        h.clock.advance(Duration::from_millis(10));
    }

    let mut sorted = dispatched.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, pids);
    h.assert_consistent();
}

#[test]
fn test_round_robin_keeps_process_within_slice() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let a = h.spawn("a", Priority::Normal);
    let b = h.spawn("b", Priority::Normal);

    assert_eq!(h.state.schedule().unwrap(), a);
    h.clock.advance(Duration::from_millis(5));
    assert_eq!(h.state.schedule().unwrap(), a);
    h.clock.advance(Duration::from_millis(5));
    assert_eq!(h.state.schedule().unwrap(), b);
}

#[test]
fn test_round_robin_prefers_higher_queue() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    h.spawn("low", Priority::Low);
    let high = h.spawn("high", Priority::High);
    assert_eq!(h.state.schedule().unwrap(), high);
}

#[test]
fn test_idle_selected_only_when_nothing_ready() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    assert_eq!(h.state.select_next_process().unwrap(), IDLE_PID);

    let pid = h.spawn("worker", Priority::Low);
    assert_eq!(h.state.select_next_process().unwrap(), pid);

    // Idle gives way as soon as a user process is ready
    h.state.block(pid, ai_os_sched::WaitReason::Io, None).unwrap();
    assert_eq!(h.state.schedule().unwrap(), IDLE_PID);
    h.state.unblock(pid).unwrap();
    assert_eq!(h.state.schedule().unwrap(), pid);
    h.assert_consistent();
}

#[test]
fn test_mlfq_demotes_once_per_aging_check() {
    let mut h = Harness::new(SchedulingPolicy::MultilevelFeedback);
    let pid = h.spawn("cruncher", Priority::Normal);

    assert_eq!(h.state.schedule().unwrap(), pid);
    h.clock.advance(Duration::from_millis(1001));

    assert_eq!(h.state.run_aging_check().unwrap(), 1);
    assert_eq!(h.state.get_process_info(pid).unwrap().priority, Priority::Low);

    assert_eq!(h.state.run_aging_check().unwrap(), 0);
    assert_eq!(h.state.get_process_info(pid).unwrap().priority, Priority::Low);
    assert_eq!(h.state.get_statistics().demotions, 1);
}

#[test]
fn test_mlfq_aging_runs_during_selection() {
    let config = ai_os_sched::SchedulerConfig::default()
        .with_policy(SchedulingPolicy::MultilevelFeedback)
        .with_max_execution_without_yield(Duration::from_secs(10));
    let mut h = Harness::with_config(config);
    let pid = h.spawn("cruncher", Priority::High);

    assert_eq!(h.state.schedule().unwrap(), pid);
    h.clock.advance(Duration::from_millis(1500));
    assert_eq!(h.state.schedule().unwrap(), pid);

    // Accumulated time is never reset, so each decision lowers it a level
    assert_eq!(h.state.get_process_info(pid).unwrap().priority, Priority::Normal);
    assert_eq!(h.state.schedule().unwrap(), pid);
    assert_eq!(h.state.get_process_info(pid).unwrap().priority, Priority::Low);
    assert_eq!(h.state.schedule().unwrap(), pid);
    assert_eq!(h.state.get_process_info(pid).unwrap().priority, Priority::Low);
    h.assert_consistent();
}

#[test]
fn test_mlfq_slices_scale_with_priority() {
    let mut h = Harness::new(SchedulingPolicy::MultilevelFeedback);
    let low = h.spawn("low", Priority::Low);

    assert_eq!(h.state.schedule().unwrap(), low);
    let info = h.state.get_process_info(low).unwrap();
    assert_eq!(info.time_slice_micros, Some(25_000));
}

#[test]
fn test_mlfq_equal_priority_waits_for_slice() {
    let mut h = Harness::new(SchedulingPolicy::MultilevelFeedback);
    let a = h.spawn("a", Priority::Normal);
    let b = h.spawn("b", Priority::Normal);

    assert_eq!(h.state.schedule().unwrap(), a);
    h.clock.advance(Duration::from_millis(10));
    assert_eq!(h.state.schedule().unwrap(), a);
    h.clock.advance(Duration::from_millis(10));
    assert_eq!(h.state.schedule().unwrap(), b);
}

#[test]
fn test_quantum_aware_boost_beats_high_priority() {
    let mut h = Harness::new(SchedulingPolicy::QuantumAware);
    let high = h.spawn("classical", Priority::High);
    let quantum = h
        .state
        .create(ProcessSpec::new("annealer").quantum(4))
        .unwrap();

    assert!(h.state.get_process_info(quantum).unwrap().is_quantum);
    assert_eq!(h.state.select_next_process().unwrap(), quantum);
    assert_eq!(h.state.schedule().unwrap(), quantum);
    assert_eq!(
        h.state.get_process_info(high).unwrap().state,
        ProcessState::Ready
    );
    h.assert_consistent();
}

#[test]
fn test_quantum_aware_small_boost_falls_back_to_priority() {
    let config = ai_os_sched::SchedulerConfig::default()
        .with_policy(SchedulingPolicy::QuantumAware)
        .with_quantum_boost(1);
    let mut h = Harness::with_config(config);
    let high = h.spawn("classical", Priority::High);
    h.state
        .create(ProcessSpec::new("annealer").quantum(4))
        .unwrap();

    assert_eq!(h.state.select_next_process().unwrap(), high);
}

#[test]
fn test_quantum_aware_promotes_quantum_process_to_front() {
    let mut h = Harness::new(SchedulingPolicy::QuantumAware);
    let first = h.spawn("first", Priority::Normal);
    let quantum = h
        .state
        .create(ProcessSpec::new("annealer").quantum(4))
        .unwrap();

    h.state.select_next_process().unwrap();
    let snapshot = h.state.queue_snapshot();
    assert_eq!(snapshot.ready_at(Priority::Normal), &[quantum, first]);
}

#[test]
fn test_policy_switch_keeps_queues() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let low = h.spawn("low", Priority::Low);
    let high = h.spawn("high", Priority::High);

    h.state.set_policy(SchedulingPolicy::Priority);
    assert_eq!(h.state.policy(), SchedulingPolicy::Priority);
    assert_eq!(h.state.schedule().unwrap(), high);
    assert_eq!(h.state.queue_snapshot().ready_at(Priority::Low), &[low]);
}
