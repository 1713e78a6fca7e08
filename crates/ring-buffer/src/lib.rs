//! Trailing Window Ring Buffer
//!
//! Provides the fixed-capacity window that backs rolling statistics and lag
//! lookups in the feature pipeline.

mod buffer;

pub use buffer::RingBuffer;

use thiserror::Error;

/// Ring buffer construction errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingBufferError {
    #[error("Ring buffer capacity must be at least 1")]
    ZeroCapacity,
}
