/*!
 * Segment Grant Guard
 *
 * RAII guard collecting the segments granted to one process during creation.
 * Dropping an uncommitted grant releases every segment in reverse order, so a
 * failed multi-segment allocation never leaks the segments already granted.
 */

use super::traits::MemoryCollaborator;
use super::types::{MemoryResult, Segment, SegmentRequest};
use crate::core::types::Pid;
use std::sync::Arc;
use tracing::warn;

pub struct SegmentGrant {
    owner: Pid,
    memory: Arc<dyn MemoryCollaborator>,
    segments: Vec<Segment>,
    committed: bool,
}

impl SegmentGrant {
    pub fn new(owner: Pid, memory: Arc<dyn MemoryCollaborator>) -> Self {
        Self {
            owner,
            memory,
            segments: Vec::new(),
            committed: false,
        }
    }

    pub fn allocate(&mut self, request: &SegmentRequest) -> MemoryResult<Segment> {
        let segment = self
            .memory
            .allocate_segment(self.owner, request.size, request.attrs)?;
        self.segments.push(segment);
        Ok(segment)
    }

    /// Allocate every request, stopping at the first refusal
    pub fn allocate_all(&mut self, requests: &[SegmentRequest]) -> MemoryResult<()> {
        for request in requests {
            self.allocate(request)?;
        }
        Ok(())
    }

    /// Keep the segments; ownership moves to the caller
    #[must_use]
    pub fn commit(mut self) -> Vec<Segment> {
        self.committed = true;
        std::mem::take(&mut self.segments)
    }

    fn release(&mut self) {
        while let Some(segment) = self.segments.pop() {
            if let Err(e) = self.memory.free_segment(segment.base) {
                warn!(
                    pid = self.owner,
                    base = segment.base,
                    error = %e,
                    "Failed to roll back segment"
                );
            }
        }
    }
}

impl Drop for SegmentGrant {
    fn drop(&mut self) {
        if !self.committed {
            self.release();
        }
    }
}
