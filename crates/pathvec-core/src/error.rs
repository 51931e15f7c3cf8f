//! Error types for the pathvec-core crate.

/// Errors produced by the path record codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The record would not fit in a single datagram.
    #[error("record too large: encoding needs {size} bytes, limit is {max}")]
    Format { size: usize, max: usize },

    /// The buffer ended before the declared contents.
    #[error("message truncated: need {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// The buffer is structurally invalid.
    #[error("malformed message: {0}")]
    Malformed(&'static str),
}
