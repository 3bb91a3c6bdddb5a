/*!
 * Simulated Collaborators
 *
 * In-process memory and quantum-register collaborators used by the host
 * binary and tests. Segments come from a bump allocator bounded by a byte
 * capacity; freed bytes return to the budget but addresses are not recycled,
 * so a double free is always detectable.
 */

use super::traits::{MemoryCollaborator, QuantumMemory};
use super::types::*;
use crate::core::limits;
use crate::core::types::{Address, Pid, Size};
use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, trace};

struct MemoryInner {
    next_base: Address,
    used: Size,
    segments: HashMap<Address, (Pid, Segment), RandomState>,
    active: Option<Pid>,
    activations: u64,
    frees: u64,
}

/// Bounded bump-allocator memory collaborator
pub struct SimulatedMemory {
    capacity: Size,
    inner: Mutex<MemoryInner>,
}

impl SimulatedMemory {
    pub fn new() -> Self {
        Self::with_capacity(limits::DEFAULT_MEMORY_CAPACITY)
    }

    /// Create memory collaborator with custom capacity (useful for testing)
    pub fn with_capacity(capacity: Size) -> Self {
        debug!(capacity, "Simulated memory collaborator initialized");
        Self {
            capacity,
            inner: Mutex::new(MemoryInner {
                next_base: limits::SEGMENT_BASE_ADDRESS,
                used: 0,
                segments: HashMap::with_hasher(RandomState::new()),
                active: None,
                activations: 0,
                frees: 0,
            }),
        }
    }

    pub fn capacity(&self) -> Size {
        self.capacity
    }

    pub fn used(&self) -> Size {
        self.inner.lock().used
    }

    pub fn live_segments(&self) -> usize {
        self.inner.lock().segments.len()
    }

    /// Live segments owned by `pid`, ordered by base address
    pub fn segments_of(&self, pid: Pid) -> Vec<Segment> {
        let inner = self.inner.lock();
        let mut owned: Vec<Segment> = inner
            .segments
            .values()
            .filter(|(owner, _)| *owner == pid)
            .map(|(_, segment)| *segment)
            .collect();
        owned.sort_by_key(|s| s.base);
        owned
    }

    pub fn active_map(&self) -> Option<Pid> {
        self.inner.lock().active
    }

    pub fn activations(&self) -> u64 {
        self.inner.lock().activations
    }

    pub fn frees(&self) -> u64 {
        self.inner.lock().frees
    }
}

impl Default for SimulatedMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCollaborator for SimulatedMemory {
    fn allocate_segment(
        &self,
        owner: Pid,
        size: Size,
        attrs: SegmentAttrs,
    ) -> MemoryResult<Segment> {
        if size == 0 {
            return Err(MemoryError::InvalidSize(size));
        }

        let mut inner = self.inner.lock();
        let available = self.capacity.saturating_sub(inner.used);
        if size > available {
            return Err(MemoryError::OutOfMemory {
                requested: size,
                available,
            });
        }

        let base = inner.next_base;
        let aligned = size.div_ceil(limits::SEGMENT_ALIGNMENT) * limits::SEGMENT_ALIGNMENT;
        inner.next_base += aligned;
        inner.used += size;

        let segment = Segment { base, size, attrs };
        inner.segments.insert(base, (owner, segment));
        trace!(pid = owner, base, size, "Segment allocated");
        Ok(segment)
    }

    fn free_segment(&self, base: Address) -> MemoryResult<()> {
        let mut inner = self.inner.lock();
        let (owner, segment) = inner
            .segments
            .remove(&base)
            .ok_or(MemoryError::InvalidAddress(base))?;
        inner.used -= segment.size;
        inner.frees += 1;
        trace!(pid = owner, base, "Segment freed");
        Ok(())
    }

    fn activate_memory_map(&self, pid: Pid) -> MemoryResult<()> {
        let mut inner = self.inner.lock();
        inner.active = Some(pid);
        inner.activations += 1;
        Ok(())
    }
}

/// Fixed-size quantum register pool
pub struct SimulatedQuantumMemory {
    registers: usize,
    grants: Mutex<HashMap<Pid, QuantumSegment, RandomState>>,
}

impl SimulatedQuantumMemory {
    pub fn new() -> Self {
        Self::with_registers(limits::DEFAULT_QUANTUM_REGISTER_POOL)
    }

    pub fn with_registers(registers: usize) -> Self {
        Self {
            registers,
            grants: Mutex::new(HashMap::with_hasher(RandomState::new())),
        }
    }

    pub fn in_use(&self) -> usize {
        self.grants.lock().values().map(|g| g.count).sum()
    }

    pub fn holds(&self, pid: Pid) -> bool {
        self.grants.lock().contains_key(&pid)
    }
}

impl Default for SimulatedQuantumMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl QuantumMemory for SimulatedQuantumMemory {
    fn allocate_registers(&self, pid: Pid, count: usize) -> MemoryResult<QuantumSegment> {
        let mut grants = self.grants.lock();
        let used: usize = grants.values().map(|g| g.count).sum();
        let available = self.registers.saturating_sub(used);
        if count == 0 || count > available {
            return Err(MemoryError::RegistersExhausted {
                requested: count,
                available,
            });
        }

        let first_register = grants
            .values()
            .map(|g| g.first_register + g.count)
            .max()
            .unwrap_or(0);
        let grant = QuantumSegment {
            first_register,
            count,
        };
        grants.insert(pid, grant);
        Ok(grant)
    }

    fn free_registers(&self, pid: Pid) -> MemoryResult<()> {
        self.grants
            .lock()
            .remove(&pid)
            .map(|_| ())
            .ok_or(MemoryError::NoAddressSpace(pid))
    }
}
