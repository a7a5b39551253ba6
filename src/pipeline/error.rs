//! Pipeline-level error taxonomy.
//!
//! Maps component failures onto the boundary behavior: a malformed request is the caller's
//! fault and surfaces as-is; an embedding, vector-store, or scoring failure is ours and is
//! kept framework-agnostic here so the HTTP layer can pick the concrete status code.

use thiserror::Error;

use crate::query::QueryError;
use crate::vectordb::VectorDbError;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request itself was invalid (empty query, unknown ranking variant, ...).
    #[error("{0}")]
    InputInvalid(String),

    /// Query embedding failed (the encoder returned an empty vector).
    #[error("embedding computation failed")]
    EmbeddingFailure,

    /// The vector store adapter returned an error.
    #[error("vector search failed")]
    VectorStoreFailure,

    /// Candidate scoring failed for the whole batch (individual dimension mismatches are
    /// dropped per-candidate by the scorer and never reach this variant).
    #[error("candidate scoring failed")]
    CandidateScoringFailure,

    /// An ingested record's vectors could not be computed to completion (the encoder
    /// degraded to an empty vector for at least one of the four fields).
    #[error("record embedding failed, refusing to index an incomplete record")]
    RecordEmbeddingIncomplete,
}

/// Whether an error is the caller's fault or ours; the HTTP layer maps this to a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    BadRequest,
    Internal,
}

impl PipelineError {
    pub fn class(&self) -> ErrorClass {
        match self {
            PipelineError::InputInvalid(_) => ErrorClass::BadRequest,
            PipelineError::EmbeddingFailure
            | PipelineError::VectorStoreFailure
            | PipelineError::CandidateScoringFailure
            | PipelineError::RecordEmbeddingIncomplete => ErrorClass::Internal,
        }
    }
}

impl From<QueryError> for PipelineError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::EmptyQuery => PipelineError::InputInvalid(err.to_string()),
            QueryError::InvalidVariant { .. } => PipelineError::InputInvalid(err.to_string()),
            QueryError::EmbeddingFailed => PipelineError::EmbeddingFailure,
        }
    }
}

impl From<VectorDbError> for PipelineError {
    fn from(_: VectorDbError) -> Self {
        PipelineError::VectorStoreFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_classifies_as_bad_request() {
        let err: PipelineError = QueryError::EmptyQuery.into();
        assert_eq!(err.class(), ErrorClass::BadRequest);
    }

    #[test]
    fn vector_store_failure_classifies_as_internal() {
        let err: PipelineError = VectorDbError::SearchFailed {
            collection: "records".into(),
            message: "down".into(),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Internal);
    }
}
