//! Sample-level building blocks: saturation intrinsics, Q15 helpers and the
//! grain history ring.

pub mod grain_buffer;
pub mod helpers;
pub mod intrinsics;

pub use grain_buffer::GrainBuffer;
