/*!
 * Memory Types
 * Segment descriptors and collaborator errors
 */

use crate::core::limits;
use crate::core::types::{Address, Pid, Size};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory collaborator result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Failures reported by the memory and quantum collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryError {
    #[error("Out of memory: requested {requested} bytes, available {available} bytes")]
    OutOfMemory { requested: Size, available: Size },

    #[error("Invalid segment size: {0}")]
    InvalidSize(Size),

    #[error("Invalid segment base: 0x{0:x}")]
    InvalidAddress(Address),

    #[error("No address space for process {0}")]
    NoAddressSpace(Pid),

    #[error("Quantum registers exhausted: requested {requested}, available {available}")]
    RegistersExhausted { requested: usize, available: usize },
}

bitflags! {
    /// Access attributes of an address-space segment
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct SegmentAttrs: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const EXEC = 1 << 2;
        const USER = 1 << 3;
        const KERNEL = 1 << 4;
    }
}

/// A segment requested at process creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRequest {
    pub size: Size,
    pub attrs: SegmentAttrs,
}

impl SegmentRequest {
    #[inline]
    pub const fn new(size: Size, attrs: SegmentAttrs) -> Self {
        Self { size, attrs }
    }

    /// Code, data and stack segments handed to processes that ask for nothing specific
    pub fn default_layout() -> Vec<Self> {
        vec![
            Self::new(
                limits::DEFAULT_CODE_SEGMENT,
                SegmentAttrs::READ | SegmentAttrs::EXEC | SegmentAttrs::USER,
            ),
            Self::new(
                limits::DEFAULT_DATA_SEGMENT,
                SegmentAttrs::READ | SegmentAttrs::WRITE | SegmentAttrs::USER,
            ),
            Self::new(
                limits::DEFAULT_STACK_SEGMENT,
                SegmentAttrs::READ | SegmentAttrs::WRITE | SegmentAttrs::USER,
            ),
        ]
    }
}

/// A granted segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub base: Address,
    pub size: Size,
    pub attrs: SegmentAttrs,
}

/// Quantum registers granted to a quantum workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumSegment {
    pub first_register: usize,
    pub count: usize,
}
