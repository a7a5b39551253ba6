use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("record body is empty, nothing to enrich")]
    EmptyBody,
    #[error("embedding encoder produced an empty vector for field '{field}'")]
    EmbeddingFailed { field: String },
}
