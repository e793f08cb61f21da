//! Error types for the postprocessing pipeline.

use std::collections::TryReserveError;

/// Output buffer exhaustion.
///
/// The only failure a stage can report. Callers fall back to the stage's
/// unmodified input.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// Allocation failed while growing the buffer.
    #[error("failed to grow output buffer by {requested} bytes: {source}")]
    Alloc {
        requested: usize,
        #[source]
        source: TryReserveError,
    },
    /// The configured output limit would be exceeded.
    #[error("output limit of {limit} bytes exceeded (needed {needed})")]
    LimitExceeded { limit: usize, needed: usize },
}

/// Error parsing an option value from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}' (expected one of: {expected})")]
pub struct ParseOptionError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}
