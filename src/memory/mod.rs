/*!
 * Memory Module
 * Address-space and quantum-register collaborators
 */

pub mod grant;
pub mod simulated;
pub mod traits;
pub mod types;

// Re-export for convenience
pub use grant::SegmentGrant;
pub use simulated::{SimulatedMemory, SimulatedQuantumMemory};
pub use traits::*;
pub use types::*;
