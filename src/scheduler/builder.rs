/*!
 * Scheduler Builder
 * Builder pattern for wiring configuration, collaborators and clock
 */

use super::{Scheduler, SchedulerState, SchedulingPolicy};
use crate::core::clock::{Clock, MonotonicClock};
use crate::core::config::SchedulerConfig;
use crate::core::errors::SchedulerResult;
use crate::memory::{MemoryCollaborator, QuantumMemory, SimulatedMemory};
use std::sync::Arc;
use tracing::info;

/// Builder for [`Scheduler`] and [`SchedulerState`]
#[derive(Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    memory: Option<Arc<dyn MemoryCollaborator>>,
    quantum_memory: Option<Arc<dyn QuantumMemory>>,
    clock: Option<Arc<dyn Clock>>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_policy(mut self, policy: SchedulingPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Memory collaborator; defaults to a simulated one sized from the config
    pub fn with_memory(mut self, memory: Arc<dyn MemoryCollaborator>) -> Self {
        self.memory = Some(memory);
        self
    }

    /// Enable quantum workloads
    pub fn with_quantum_memory(mut self, quantum: Arc<dyn QuantumMemory>) -> Self {
        self.quantum_memory = Some(quantum);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build an initialized state without the shared handle
    pub fn build_state(self) -> SchedulerResult<SchedulerState> {
        self.config.validate()?;

        let memory = self.memory.unwrap_or_else(|| {
            Arc::new(SimulatedMemory::with_capacity(self.config.memory_capacity))
        });
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        let mut state = SchedulerState::new(self.config, memory, clock);
        if let Some(quantum) = self.quantum_memory {
            state = state.with_quantum_memory(quantum);
        }
        state.initialize()?;

        info!(policy = %state.policy(), "Scheduler state built");
        Ok(state)
    }

    pub fn build(self) -> SchedulerResult<Scheduler> {
        self.build_state().map(Scheduler::new)
    }
}
