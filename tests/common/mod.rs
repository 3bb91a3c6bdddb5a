/*!
 * Shared test fixtures
 */

#![allow(dead_code)]

use ai_os_sched::{
    ManualClock, Pid, Priority, ProcessSpec, SchedulerBuilder, SchedulerConfig, SchedulerState,
    SchedulingPolicy, SimulatedMemory, SimulatedQuantumMemory,
};
use std::sync::Arc;

pub struct Harness {
    pub state: SchedulerState,
    pub clock: Arc<ManualClock>,
    pub memory: Arc<SimulatedMemory>,
    pub quantum: Arc<SimulatedQuantumMemory>,
}

impl Harness {
    pub fn new(policy: SchedulingPolicy) -> Self {
        Self::with_config(SchedulerConfig::default().with_policy(policy))
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        let clock = Arc::new(ManualClock::new());
        let memory = Arc::new(SimulatedMemory::new());
        let quantum = Arc::new(SimulatedQuantumMemory::new());
        let state = SchedulerBuilder::new()
            .with_config(config)
            .with_memory(memory.clone())
            .with_quantum_memory(quantum.clone())
            .with_clock(clock.clone())
            .build_state()
            .expect("valid test configuration");
        Self {
            state,
            clock,
            memory,
            quantum,
        }
    }

    pub fn spawn(&mut self, name: &str, priority: Priority) -> Pid {
        self.state
            .create(ProcessSpec::new(name).with_priority(priority))
            .expect("process creation")
    }

    pub fn assert_consistent(&self) {
        if let Err(violations) = self.state.check_invariants() {
            panic!("invariants violated: {:#?}", violations);
        }
    }
}
