/*!
 * Memory Traits
 * Collaborator interfaces the scheduling core calls into
 */

use super::types::*;
use crate::core::types::{Address, Pid, Size};

/// Address-space collaborator
///
/// Invoked during create (allocate), terminate (free) and context switch (activate).
pub trait MemoryCollaborator: Send + Sync {
    /// Allocate one segment owned by `owner`
    fn allocate_segment(&self, owner: Pid, size: Size, attrs: SegmentAttrs)
        -> MemoryResult<Segment>;

    /// Release a segment by base address
    fn free_segment(&self, base: Address) -> MemoryResult<()>;

    /// Make the address space of `pid` current
    fn activate_memory_map(&self, pid: Pid) -> MemoryResult<()>;
}

/// Optional quantum-register collaborator for quantum-flagged processes
pub trait QuantumMemory: Send + Sync {
    fn allocate_registers(&self, pid: Pid, count: usize) -> MemoryResult<QuantumSegment>;

    fn free_registers(&self, pid: Pid) -> MemoryResult<()>;
}
