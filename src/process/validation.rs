/*!
 * Process Validation
 *
 * Legal state transitions and whole-state consistency checks. The checks are
 * cheap enough to run after every operation in tests and are exposed for
 * diagnostics in the host binary.
 */

use super::types::{ProcessState, WaitReason};
use crate::core::errors::{SchedulerError, SchedulerResult};
use crate::core::types::{Pid, IDLE_PID};
use crate::scheduler::SchedulerState;

/// Whether `from -> to` is a legal lifecycle transition
pub const fn can_transition(from: ProcessState, to: ProcessState) -> bool {
    use ProcessState::*;
    matches!(
        (from, to),
        (Created, Ready)
            | (Ready, Running)
            | (Running, Ready)
            | (Ready, Waiting)
            | (Running, Waiting)
            | (Waiting, Ready)
            | (Created, Terminated)
            | (Ready, Terminated)
            | (Running, Terminated)
            | (Waiting, Terminated)
    )
}

pub(crate) fn ensure_transition(
    pid: Pid,
    from: ProcessState,
    to: ProcessState,
    operation: &str,
) -> SchedulerResult<()> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(SchedulerError::invalid_state(pid, from, operation))
    }
}

impl SchedulerState {
    /// Verify table/queue consistency, returning every violation found
    pub fn check_invariants(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();
        let current = self.table.current();

        let running: Vec<Pid> = self
            .table
            .iter()
            .filter(|p| p.state == ProcessState::Running)
            .map(|p| p.pid)
            .collect();
        if running.len() > 1 {
            violations.push(format!("more than one RUNNING process: {:?}", running));
        }
        match current {
            Some(pid) if !running.contains(&pid) => {
                violations.push(format!("current process {} is not RUNNING", pid));
            }
            None if !running.is_empty() => {
                violations.push(format!("RUNNING process {:?} is not current", running));
            }
            _ => {}
        }

        for process in self.table.iter() {
            let pid = process.pid;
            let total = self.queues.occurrences(pid);
            let expected_home = match process.state {
                ProcessState::Ready => Some(self.queues.ready(process.priority)),
                ProcessState::Waiting => match process.waiting_reason {
                    Some(reason) => Some(self.queues.waiting(reason)),
                    None => {
                        violations.push(format!("WAITING process {} has no reason", pid));
                        None
                    }
                },
                _ => None,
            };

            match expected_home {
                Some(queue) => {
                    let at_home = queue.iter().filter(|&&p| p == pid).count();
                    if at_home != 1 || total != 1 {
                        violations.push(format!(
                            "{} process {} queued {} time(s) in its queue, {} overall",
                            process.state, pid, at_home, total
                        ));
                    }
                }
                None if total != 0 => {
                    violations.push(format!(
                        "{} process {} appears in {} queue(s)",
                        process.state, pid, total
                    ));
                }
                None => {}
            }

            if process.state != ProcessState::Waiting && process.waiting_reason.is_some() {
                violations.push(format!("process {} keeps a stale wait reason", pid));
            }

            if let Some(parent_pid) = process.parent_pid {
                if let Some(parent) = self.table.get(parent_pid) {
                    let listed = parent.children.contains(&pid);
                    if process.is_live() && !listed {
                        violations.push(format!(
                            "live process {} missing from parent {} children",
                            pid, parent_pid
                        ));
                    }
                    if !process.is_live() && listed {
                        violations.push(format!(
                            "terminated process {} still listed by parent {}",
                            pid, parent_pid
                        ));
                    }
                }
            }
        }

        for priority in super::types::Priority::DESCENDING {
            for &pid in self.queues.ready(priority) {
                if !self.table.contains(pid) {
                    violations.push(format!("ready queue {} holds unknown pid {}", priority, pid));
                }
            }
        }
        for reason in WaitReason::ALL {
            for &pid in self.queues.waiting(reason) {
                if !self.table.contains(pid) {
                    violations.push(format!("waiting queue {} holds unknown pid {}", reason, pid));
                }
            }
        }

        let user_running = current.is_some_and(|pid| pid != IDLE_PID);
        let idle_live = self.table.get(IDLE_PID).is_some_and(|p| p.is_live());
        if self.initialized && !user_running && !idle_live {
            violations.push("no idle process while no user process runs".to_string());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
