//! Candidate scoring error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// A stored vector's dimensionality did not match the query vector; the candidate is
    /// dropped rather than the whole batch failing.
    #[error("candidate '{id}' has a vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        got: usize,
    },
}
