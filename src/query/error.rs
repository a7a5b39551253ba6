//! Query preparation error types.

use thiserror::Error;

/// Errors on the query-preparation critical path. Normalization and expansion never
/// produce these — they degrade silently per the component contract; only the final
/// embed step and request-shape validation are fatal.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Search query cannot be empty.")]
    EmptyQuery,

    #[error("embedding computation failed")]
    EmbeddingFailed,

    #[error("invalid ranking variant '{value}': expected 'A' or 'B'")]
    InvalidVariant { value: String },
}
