/*!
 * Lifecycle Tests
 * Creation, blocking, unblocking, priority changes and termination
 */

use crate::common::Harness;
use ai_os_sched::{
    ErrorKind, Priority, ProcessFlags, ProcessSpec, ProcessState, SchedulerConfig,
    SchedulerState, SchedulingPolicy, SegmentAttrs, SegmentRequest, Severity, SimulatedMemory,
    ManualClock, TerminationReason, WaitReason, IDLE_PID,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[test]
fn test_operations_before_initialize() {
    let mut state = SchedulerState::new(
        SchedulerConfig::default(),
        Arc::new(SimulatedMemory::new()),
        Arc::new(ManualClock::new()),
    );

    let err = state.create(ProcessSpec::new("early")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotInitialized);
    assert_eq!(state.schedule().unwrap_err().kind(), ErrorKind::NotInitialized);
    assert_eq!(state.errors().len(), 2);

    state.initialize().unwrap();
    assert!(state.create(ProcessSpec::new("on time")).is_ok());
}

#[test]
fn test_pids_are_never_reused() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let first = h.spawn("first", Priority::Normal);
    h.state.terminate(first, 0, TerminationReason::Normal).unwrap();
    h.state.reap(first).unwrap();

    let second = h.spawn("second", Priority::Normal);
    assert!(second > first);
}

#[test]
fn test_creation_flags_set_priority() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let rt = h
        .state
        .create(ProcessSpec::new("rt").with_flags(ProcessFlags::REALTIME))
        .unwrap();
    let hi = h
        .state
        .create(
            ProcessSpec::new("hi")
                .with_priority(Priority::Low)
                .with_flags(ProcessFlags::HIGH_PRIORITY),
        )
        .unwrap();

    assert_eq!(h.state.get_process_info(rt).unwrap().priority, Priority::Realtime);
    assert_eq!(h.state.get_process_info(hi).unwrap().priority, Priority::High);
}

#[test]
fn test_failed_segment_allocation_rolls_back() {
    let config = SchedulerConfig::default();
    let memory = Arc::new(SimulatedMemory::with_capacity(100 * 1024));
    let mut state = SchedulerState::new(config, memory.clone(), Arc::new(ManualClock::new()));
    state.initialize().unwrap();

    let err = state.create(ProcessSpec::new("too big")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
    assert_eq!(memory.live_segments(), 0);
    assert_eq!(memory.used(), 0);
    assert_eq!(state.list_processes().len(), 1);

    // The failed attempt consumed pid 1
    let pid = state
        .create(ProcessSpec::new("small").with_segments(vec![SegmentRequest::new(
            4096,
            SegmentAttrs::READ | SegmentAttrs::WRITE,
        )]))
        .unwrap();
    assert_eq!(pid, 2);
}

#[test]
fn test_empty_name_rejected() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let err = h.state.create(ProcessSpec::new("  ")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_block_unblock_round_trip() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let pid = h.spawn("io", Priority::Normal);
    let other = h.spawn("other", Priority::Normal);

    h.state.block_named(pid, "IO", Some(42)).unwrap();
    let info = h.state.get_process_info(pid).unwrap();
    assert_eq!(info.state, ProcessState::Waiting);
    assert_eq!(info.waiting_reason, Some(WaitReason::Io));
    assert_eq!(h.state.queue_snapshot().waiting_on(WaitReason::Io), &[pid]);

    h.state.unblock(pid).unwrap();
    let info = h.state.get_process_info(pid).unwrap();
    assert_eq!(info.state, ProcessState::Ready);
    assert_eq!(info.waiting_reason, None);
    assert_eq!(info.wait_start_time, None);
    assert_eq!(
        h.state.queue_snapshot().ready_at(Priority::Normal),
        &[other, pid]
    );
    h.assert_consistent();
}

#[test]
fn test_unknown_wait_reason_becomes_other() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let pid = h.spawn("odd", Priority::Normal);

    h.state.block_named(pid, "GPU", None).unwrap();
    assert_eq!(
        h.state.get_process_info(pid).unwrap().waiting_reason,
        Some(WaitReason::Other)
    );
    let warnings = h.state.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert_eq!(warnings[0].pid, Some(pid));
}

#[test]
fn test_block_running_process_charges_time() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let pid = h.spawn("worker", Priority::Normal);

    h.state.schedule().unwrap();
    h.clock.advance(Duration::from_millis(7));
    h.state.block(pid, WaitReason::Lock, None).unwrap();

    assert_eq!(h.state.current_pid(), None);
    let info = h.state.get_process_info(pid).unwrap();
    assert_eq!(info.execution_time, Duration::from_millis(7));
    assert_eq!(info.wait_start_time, Some(7_000));
    h.assert_consistent();
}

#[test]
fn test_invalid_state_transitions() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let pid = h.spawn("worker", Priority::Normal);

    assert_eq!(h.state.unblock(pid).unwrap_err().kind(), ErrorKind::InvalidState);
    h.state.terminate(pid, 0, TerminationReason::Normal).unwrap();
    assert_eq!(
        h.state.block(pid, WaitReason::Io, None).unwrap_err().kind(),
        ErrorKind::InvalidState
    );
    assert_eq!(
        h.state.change_priority(pid, Priority::High).unwrap_err().kind(),
        ErrorKind::InvalidState
    );
    assert_eq!(h.state.unblock(999).unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn test_idle_process_is_protected() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    assert_eq!(
        h.state.block(IDLE_PID, WaitReason::Io, None).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
    assert_eq!(
        h.state.change_priority(IDLE_PID, Priority::High).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn test_terminated_idle_is_recreated() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    h.state.terminate(IDLE_PID, 0, TerminationReason::Killed).unwrap();
    h.state.reap(IDLE_PID).unwrap();

    assert_eq!(h.state.schedule().unwrap(), IDLE_PID);
    assert_eq!(h.state.get_statistics().idle_recreations, 1);
    assert_eq!(
        h.state.get_process_info(IDLE_PID).unwrap().state,
        ProcessState::Running
    );
    h.assert_consistent();
}

#[test]
fn test_change_priority_moves_ready_process() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let pid = h.spawn("mover", Priority::Low);
    let peer = h.spawn("peer", Priority::High);

    h.state.change_priority(pid, Priority::High).unwrap();
    let snapshot = h.state.queue_snapshot();
    assert!(snapshot.ready_at(Priority::Low).is_empty());
    assert_eq!(snapshot.ready_at(Priority::High), &[peer, pid]);

    // No-op when unchanged
    h.state.change_priority(pid, Priority::High).unwrap();
    assert_eq!(h.state.queue_snapshot().ready_at(Priority::High), &[peer, pid]);
    h.assert_consistent();
}

#[test]
fn test_set_priority_level_validates() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let pid = h.spawn("p", Priority::Normal);

    h.state.set_priority_level(pid, 4).unwrap();
    assert_eq!(h.state.get_process_info(pid).unwrap().priority, Priority::Realtime);
    assert_eq!(
        h.state.set_priority_level(pid, 5).unwrap_err().kind(),
        ErrorKind::InvalidArgument
    );
}

#[test]
fn test_waiting_process_priority_applies_on_wake() {
    let mut h = Harness::new(SchedulingPolicy::Priority);
    let pid = h.spawn("sleeper", Priority::Low);

    h.state.block(pid, WaitReason::Sleep, None).unwrap();
    h.state.change_priority(pid, Priority::High).unwrap();
    h.state.unblock(pid).unwrap();
    assert_eq!(h.state.queue_snapshot().ready_at(Priority::High), &[pid]);
}

#[test]
fn test_terminate_is_idempotent() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let pid = h.spawn("once", Priority::Normal);
    assert_eq!(h.memory.segments_of(pid).len(), 3);

    h.state.terminate(pid, 3, TerminationReason::Normal).unwrap();
    let frees = h.memory.frees();
    assert_eq!(frees, 3);

    h.state.terminate(pid, 9, TerminationReason::Killed).unwrap();
    assert_eq!(h.memory.frees(), frees);
    let info = h.state.get_process_info(pid).unwrap();
    assert_eq!(info.exit_code, Some(3));
    assert_eq!(info.termination_reason, Some(TerminationReason::Normal));
    assert!(h.state.errors().is_empty());
    assert!(h.state.warnings().is_empty());
}

#[test]
fn test_quantum_registers_released_on_terminate() {
    let mut h = Harness::new(SchedulingPolicy::QuantumAware);
    let pid = h.state.create(ProcessSpec::new("q").quantum(8)).unwrap();
    assert!(h.quantum.holds(pid));

    h.state.terminate(pid, 0, TerminationReason::Normal).unwrap();
    assert!(!h.quantum.holds(pid));
    assert_eq!(h.quantum.in_use(), 0);
}

#[test]
fn test_resume_suspended_process() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    let pid = h.state.create(ProcessSpec::new("parked").suspended()).unwrap();

    assert_eq!(h.state.schedule().unwrap(), IDLE_PID);
    h.state.resume(pid).unwrap();
    assert_eq!(h.state.schedule().unwrap(), pid);
    assert!(!h
        .state
        .get_process_info(pid)
        .unwrap()
        .flags
        .contains(ProcessFlags::SUSPENDED));
}

#[test]
fn test_error_ring_keeps_latest_hundred() {
    let mut h = Harness::new(SchedulingPolicy::RoundRobin);
    for pid in 1000..1150 {
        let _ = h.state.unblock(pid);
    }

    let errors = h.state.errors();
    assert_eq!(errors.len(), 100);
    assert_eq!(errors[0].pid, Some(1050));
    assert_eq!(errors[99].pid, Some(1149));
    assert_eq!(h.state.get_statistics().errors_recorded, 150);
}
