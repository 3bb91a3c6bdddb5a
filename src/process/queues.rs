/*!
 * Queue Manager
 *
 * Five FIFO ready queues indexed by priority and seven waiting queues
 * indexed by wait reason. Pure container logic over pids: removal is a
 * linear scan, and uniqueness of a pid across queues is the lifecycle
 * layer's responsibility.
 */

use super::types::{Priority, WaitReason};
use crate::core::types::Pid;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Default)]
pub struct QueueManager {
    ready: [VecDeque<Pid>; Priority::COUNT],
    waiting: [VecDeque<Pid>; WaitReason::COUNT],
}

impl QueueManager {
    pub fn new() -> Self {
        Self::default()
    }

    // Ready queues

    pub fn push_ready(&mut self, priority: Priority, pid: Pid) {
        self.ready[priority.index()].push_back(pid);
    }

    pub fn push_ready_front(&mut self, priority: Priority, pid: Pid) {
        self.ready[priority.index()].push_front(pid);
    }

    pub fn remove_ready(&mut self, priority: Priority, pid: Pid) -> bool {
        remove_pid(&mut self.ready[priority.index()], pid)
    }

    #[inline]
    pub fn peek_ready(&self, priority: Priority) -> Option<Pid> {
        self.ready[priority.index()].front().copied()
    }

    pub fn pop_ready(&mut self, priority: Priority) -> Option<Pid> {
        self.ready[priority.index()].pop_front()
    }

    /// Move the head of a ready queue to its tail
    pub fn rotate_ready(&mut self, priority: Priority) {
        let queue = &mut self.ready[priority.index()];
        if !queue.is_empty() {
            queue.rotate_left(1);
        }
    }

    /// Move `pid` to the head of its ready queue
    pub fn move_to_front(&mut self, priority: Priority, pid: Pid) -> bool {
        if self.remove_ready(priority, pid) {
            self.push_ready_front(priority, pid);
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn ready(&self, priority: Priority) -> &VecDeque<Pid> {
        &self.ready[priority.index()]
    }

    pub fn ready_len(&self) -> usize {
        self.ready.iter().map(VecDeque::len).sum()
    }

    /// Ready queues from realtime down to idle
    pub fn ready_descending(&self) -> impl Iterator<Item = (Priority, &VecDeque<Pid>)> {
        Priority::DESCENDING
            .into_iter()
            .map(move |p| (p, &self.ready[p.index()]))
    }

    // Waiting queues

    pub fn push_waiting(&mut self, reason: WaitReason, pid: Pid) {
        self.waiting[reason.index()].push_back(pid);
    }

    pub fn remove_waiting(&mut self, reason: WaitReason, pid: Pid) -> bool {
        remove_pid(&mut self.waiting[reason.index()], pid)
    }

    #[inline]
    pub fn waiting(&self, reason: WaitReason) -> &VecDeque<Pid> {
        &self.waiting[reason.index()]
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.iter().map(VecDeque::len).sum()
    }

    // Whole-manager helpers

    /// Remove `pid` from every queue, returning how many entries were dropped
    pub fn purge(&mut self, pid: Pid) -> usize {
        self.ready
            .iter_mut()
            .chain(self.waiting.iter_mut())
            .map(|q| {
                let before = q.len();
                q.retain(|&p| p != pid);
                before - q.len()
            })
            .sum()
    }

    /// Total number of entries for `pid` across all queues
    pub fn occurrences(&self, pid: Pid) -> usize {
        self.ready
            .iter()
            .chain(self.waiting.iter())
            .map(|q| q.iter().filter(|&&p| p == pid).count())
            .sum()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            ready: self.ready.iter().map(|q| q.iter().copied().collect()).collect(),
            waiting: WaitReason::ALL
                .into_iter()
                .map(|r| (r, self.waiting[r.index()].iter().copied().collect()))
                .collect(),
        }
    }
}

/// Copy of every queue's contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Indexed by priority level
    pub ready: Vec<Vec<Pid>>,
    pub waiting: Vec<(WaitReason, Vec<Pid>)>,
}

impl QueueSnapshot {
    pub fn ready_at(&self, priority: Priority) -> &[Pid] {
        &self.ready[priority.index()]
    }

    pub fn waiting_on(&self, reason: WaitReason) -> &[Pid] {
        self.waiting
            .iter()
            .find(|(r, _)| *r == reason)
            .map(|(_, pids)| pids.as_slice())
            .unwrap_or(&[])
    }
}

fn remove_pid(queue: &mut VecDeque<Pid>, pid: Pid) -> bool {
    match queue.iter().position(|&p| p == pid) {
        Some(pos) => {
            queue.remove(pos);
            true
        }
        None => false,
    }
}
