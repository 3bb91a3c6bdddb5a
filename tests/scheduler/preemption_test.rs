/*!
 * Preemption Tests
 * Forced rescheduling, voluntary yields and context switch effects
 */

use crate::common::Harness;
use ai_os_sched::{
    Priority, ProcessState, SchedulerConfig, SchedulingPolicy, Timestamp, IDLE_PID,
};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_runaway_process_is_preempted() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let hog = h.spawn("hog", Priority::Realtime);
    let victim = h.spawn("victim", Priority::Low);

    assert_eq!(h.state.schedule().unwrap(), hog);
    h.clock.advance(Duration::from_millis(101));
    assert_eq!(h.state.schedule().unwrap(), victim);

    let stats = h.state.get_statistics();
    assert_eq!(stats.preemptions, 1);
    assert_eq!(
        h.state.get_process_info(hog).unwrap().state,
        ProcessState::Ready
    );
    assert_eq!(
        h.state.get_process_info(hog).unwrap().execution_time,
        Duration::from_millis(101)
    );
    h.assert_consistent();
}

struct HogRun {
    preemptions: u64,
    longest_run: Duration,
    contender_dispatches: u64,
}

/// A HIGH process that never yields against a LOW contender, scheduled every
/// 20ms for 300ms
fn run_hog(policy: SchedulingPolicy, slice: Duration) -> HogRun {
    let config = SchedulerConfig::default()
        .with_policy(policy)
        .with_time_slice(slice);
    let mut h = Harness::with_config(config);
    let hog = h.spawn("hog", Priority::High);
    let contender = h.spawn("contender", Priority::Low);

    let step = Duration::from_millis(20);
    let mut now: Timestamp = 0;
    let mut longest_run = Duration::ZERO;
    assert_eq!(h.state.schedule().unwrap(), hog);
    for _ in 0..15 {
        h.clock.advance(step);
        now += step.as_micros() as Timestamp;
        if h.state.schedule().unwrap() == hog {
            let dispatched = h.state.get_process_info(hog).unwrap().last_scheduled.unwrap();
            longest_run = longest_run.max(Duration::from_micros(now - dispatched));
        }
        h.assert_consistent();
    }

    HogRun {
        preemptions: h.state.get_statistics().preemptions,
        longest_run,
        contender_dispatches: h.state.get_process_info(contender).unwrap().dispatches,
    }
}

#[test]
fn test_execution_limit_enforced_under_every_policy() {
    let limit = SchedulerConfig::default().max_execution_without_yield;
    let long_slice = Duration::from_millis(200);

    for policy in SchedulingPolicy::ALL {
        for slice in [SchedulerConfig::default().base_time_slice, long_slice] {
            let run = run_hog(policy, slice);
            assert!(
                run.longest_run <= limit,
                "{} with {:?} slice: hog held the CPU for {:?}",
                policy,
                slice,
                run.longest_run
            );
            assert!(run.contender_dispatches > 0, "{} starved the contender", policy);

            // Round robin rotates on its own when the slice is under the limit
            let rotates_first = policy == SchedulingPolicy::RoundRobin && slice < limit;
            if !rotates_first {
                assert!(
                    run.preemptions >= 1,
                    "{} with {:?} slice never preempted",
                    policy,
                    slice
                );
            }
        }
    }
}

#[test]
fn test_slice_renewal_does_not_reset_execution_limit() {
    let mut h = Harness::new(SchedulingPolicy::MultilevelFeedback);
    let hog = h.spawn("hog", Priority::High);
    let other = h.spawn("other", Priority::Low);

    assert_eq!(h.state.schedule().unwrap(), hog);
    for _ in 0..5 {
        h.clock.advance(Duration::from_millis(20));
        assert_eq!(h.state.schedule().unwrap(), hog);
    }
    h.clock.advance(Duration::from_millis(20));
    assert_eq!(h.state.schedule().unwrap(), other);
    assert_eq!(h.state.get_statistics().preemptions, 1);
    assert_eq!(
        h.state.get_process_info(hog).unwrap().execution_time,
        Duration::from_millis(120)
    );
}

#[test]
fn test_runaway_without_contender_keeps_running() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let solo = h.spawn("solo", Priority::Normal);

    assert_eq!(h.state.schedule().unwrap(), solo);
    h.clock.advance(Duration::from_millis(250));
    assert_eq!(h.state.schedule().unwrap(), solo);
    assert_eq!(h.state.get_statistics().preemptions, 0);
    assert_eq!(
        h.state.get_process_info(solo).unwrap().execution_time,
        Duration::from_millis(250)
    );
}

#[test]
fn test_limit_is_exclusive() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let hog = h.spawn("hog", Priority::High);
    h.spawn("other", Priority::Low);

    h.state.schedule().unwrap();
    h.clock.advance(Duration::from_millis(100));
    assert_eq!(h.state.schedule().unwrap(), hog);
}

#[test]
fn test_yield_hands_cpu_to_lower_priority() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let high = h.spawn("high", Priority::High);
    let low = h.spawn("low", Priority::Low);

    assert_eq!(h.state.schedule().unwrap(), high);
    assert_eq!(h.state.yield_now().unwrap(), low);
    assert_eq!(h.state.get_statistics().voluntary_yields, 1);
    assert_eq!(h.state.queue_snapshot().ready_at(Priority::High), &[high]);
    h.assert_consistent();
}

#[test]
fn test_yield_from_idle_is_a_plain_decision() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    assert_eq!(h.state.yield_now().unwrap(), IDLE_PID);
    assert_eq!(h.state.get_statistics().voluntary_yields, 0);
}

#[test]
fn test_context_switch_saves_and_restores() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let a = h.spawn("a", Priority::Normal);
    let b = h.spawn("b", Priority::Normal);
    h.state.set_context(a, 0xA).unwrap();

    h.state.schedule().unwrap();
    h.clock.advance(Duration::from_millis(3));
    h.state.schedule().unwrap();

    let info = h.state.get_process_info(a).unwrap();
    assert_eq!(info.context.token, 0xA);
    assert_eq!(info.context.saves, 1);
    assert_eq!(info.context.restores, 1);
    assert_eq!(info.context.saved_at, Some(3_000));

    assert_eq!(h.memory.active_map(), Some(b));
    assert_eq!(h.memory.activations(), 2);
}

#[test]
fn test_idle_dispatch_counted() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let pid = h.spawn("worker", Priority::Normal);

    assert_eq!(h.state.schedule().unwrap(), pid);
    h.state
        .terminate(pid, 0, ai_os_sched::TerminationReason::Normal)
        .unwrap();
    assert_eq!(h.state.schedule().unwrap(), IDLE_PID);

    let stats = h.state.get_statistics();
    assert_eq!(stats.idle_dispatches, 1);
    assert_eq!(stats.context_switches, 2);
}
