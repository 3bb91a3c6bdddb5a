/*!
 * Process Table
 * Owns every descriptor and the running-process slot
 */

use super::descriptor::Process;
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{Pid, FIRST_USER_PID};
use ahash::RandomState;
use std::collections::HashMap;

/// Process table
///
/// Pids are handed out monotonically and never reused; the idle process
/// keeps the reserved pid 0.
#[derive(Debug)]
pub struct ProcessTable {
    processes: HashMap<Pid, Process, RandomState>,
    /// `None` once the pid space is used up
    next_pid: Option<Pid>,
    current_pid: Option<Pid>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            processes: HashMap::with_hasher(RandomState::new()),
            next_pid: Some(FIRST_USER_PID),
            current_pid: None,
        }
    }

    /// Next unused pid
    pub fn allocate_pid(&mut self) -> SchedulerResult<Pid> {
        let pid = self
            .next_pid
            .ok_or_else(|| SchedulerError::ResourceExhausted("pid space exhausted".into()))?;
        self.next_pid = pid.checked_add(1);
        Ok(pid)
    }

    #[cfg(test)]
    pub(crate) fn skip_pids_to(&mut self, pid: Pid) {
        self.next_pid = Some(pid);
    }

    pub fn insert(&mut self, process: Process) {
        self.processes.insert(process.pid, process);
    }

    pub fn remove(&mut self, pid: Pid) -> Option<Process> {
        self.processes.remove(&pid)
    }

    #[inline]
    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    #[inline]
    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.processes.get_mut(&pid)
    }

    #[inline]
    pub fn contains(&self, pid: Pid) -> bool {
        self.processes.contains_key(&pid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn live_count(&self) -> usize {
        self.processes.values().filter(|p| p.is_live()).count()
    }

    #[inline]
    pub fn current(&self) -> Option<Pid> {
        self.current_pid
    }

    pub fn current_process(&self) -> Option<&Process> {
        self.current_pid.and_then(|pid| self.processes.get(&pid))
    }

    pub fn set_current(&mut self, pid: Pid) {
        self.current_pid = Some(pid);
    }

    pub fn clear_current(&mut self) -> Option<Pid> {
        self.current_pid.take()
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
