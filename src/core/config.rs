/*!
 * Scheduler Configuration
 * Tunables loaded from defaults, environment variables, or JSON
 */

use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::limits;
use crate::scheduler::SchedulingPolicy;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Scheduler tunables
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SchedulerConfig {
    pub policy: SchedulingPolicy,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub base_time_slice: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_execution_without_yield: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub aging_threshold: Duration,
    /// Priority levels added to quantum workloads under quantum-aware scheduling
    pub quantum_boost: u8,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub tick_interval: Duration,
    pub memory_capacity: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: SchedulingPolicy::RoundRobin,
            base_time_slice: limits::DEFAULT_TIME_SLICE,
            max_execution_without_yield: limits::DEFAULT_MAX_EXECUTION_WITHOUT_YIELD,
            aging_threshold: limits::DEFAULT_AGING_THRESHOLD,
            quantum_boost: limits::DEFAULT_QUANTUM_BOOST,
            tick_interval: limits::DEFAULT_TICK_INTERVAL,
            memory_capacity: limits::DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl SchedulerConfig {
    /// Defaults overridden by environment variables
    ///
    /// - SCHED_POLICY: round_robin | priority | mlfq | quantum_aware
    /// - SCHED_TIME_SLICE_MS, SCHED_MAX_RUN_MS, SCHED_AGING_MS, SCHED_TICK_MS
    /// - SCHED_QUANTUM_BOOST
    pub fn from_env() -> SchedulerResult<Self> {
        let mut config = Self::default();

        if let Ok(policy) = std::env::var("SCHED_POLICY") {
            config.policy =
                SchedulingPolicy::from_str(&policy).map_err(SchedulerError::InvalidArgument)?;
        }
        if let Some(ms) = env_millis("SCHED_TIME_SLICE_MS")? {
            config.base_time_slice = ms;
        }
        if let Some(ms) = env_millis("SCHED_MAX_RUN_MS")? {
            config.max_execution_without_yield = ms;
        }
        if let Some(ms) = env_millis("SCHED_AGING_MS")? {
            config.aging_threshold = ms;
        }
        if let Some(ms) = env_millis("SCHED_TICK_MS")? {
            config.tick_interval = ms;
        }
        if let Ok(boost) = std::env::var("SCHED_QUANTUM_BOOST") {
            config.quantum_boost = boost.parse().map_err(|_| {
                SchedulerError::InvalidArgument(format!("SCHED_QUANTUM_BOOST={}", boost))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document, missing fields take their defaults
    pub fn from_json(json: &str) -> SchedulerResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SchedulerError::InvalidArgument(format!("config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> SchedulerResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            SchedulerError::InvalidArgument(format!("config {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    #[must_use]
    pub fn with_policy(mut self, policy: SchedulingPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_time_slice(mut self, slice: Duration) -> Self {
        self.base_time_slice = slice;
        self
    }

    #[must_use]
    pub fn with_max_execution_without_yield(mut self, limit: Duration) -> Self {
        self.max_execution_without_yield = limit;
        self
    }

    #[must_use]
    pub fn with_aging_threshold(mut self, threshold: Duration) -> Self {
        self.aging_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_quantum_boost(mut self, boost: u8) -> Self {
        self.quantum_boost = boost;
        self
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        let durations = [
            ("base_time_slice", self.base_time_slice),
            ("max_execution_without_yield", self.max_execution_without_yield),
            ("aging_threshold", self.aging_threshold),
            ("tick_interval", self.tick_interval),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, d)| d.is_zero()) {
            return Err(SchedulerError::InvalidArgument(format!(
                "{} must be greater than zero",
                name
            )));
        }
        if self.quantum_boost > crate::process::Priority::Realtime.level() {
            return Err(SchedulerError::InvalidArgument(format!(
                "quantum_boost {} exceeds the priority range",
                self.quantum_boost
            )));
        }
        Ok(())
    }
}

fn env_millis(key: &str) -> SchedulerResult<Option<Duration>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| SchedulerError::InvalidArgument(format!("{}={}", key, raw))),
        Err(_) => Ok(None),
    }
}
