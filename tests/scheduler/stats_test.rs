/*!
 * Statistics Tests
 */

use crate::common::Harness;
use ai_os_sched::{Priority, SchedulingPolicy, WaitReason};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn test_wait_accounting() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let a = h.spawn("a", Priority::Normal);
    let b = h.spawn("b", Priority::Normal);

    h.state.block(a, WaitReason::Io, None).unwrap();
    h.state.block(b, WaitReason::Lock, None).unwrap();
    h.clock.advance(Duration::from_millis(10));
    h.state.unblock(a).unwrap();
    h.clock.advance(Duration::from_millis(20));
    h.state.unblock(b).unwrap();

    let stats = h.state.get_statistics();
    assert_eq!(stats.processes_waited, 2);
    assert_eq!(stats.total_wait_time, Duration::from_millis(40));
    assert_eq!(stats.average_wait_time, Duration::from_millis(20));
}

#[test]
fn test_statistics_serialize_durations_as_micros() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let pid = h.spawn("a", Priority::Normal);
    h.state.block(pid, WaitReason::Io, None).unwrap();
    h.clock.advance(Duration::from_millis(2));
    h.state.unblock(pid).unwrap();

    let json = serde_json::to_value(h.state.get_statistics()).unwrap();
    assert_eq!(json["policy"], "priority");
    assert_eq!(json["total_wait_time"], 2_000);
    assert_eq!(json["processes_waited"], 1);
}

#[test]
fn test_process_counts() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let a = h.spawn("a", Priority::Normal);
    h.spawn("b", Priority::Normal);
    h.state.block(a, WaitReason::Event, None).unwrap();

    let stats = h.state.get_statistics();
    assert_eq!(stats.total_processes, 3);
    assert_eq!(stats.live_processes, 3);
    // idle and b
    assert_eq!(stats.ready_processes, 2);
    assert_eq!(stats.waiting_processes, 1);
}
