//! Wires the individually-tested component modules (`cache`, `query`, `scoring`, `rerank`,
//! `ranking`, `vectordb`, `llm`, `dedupe`, `ingest`) into the two control flows the system
//! actually exposes: a query path and an ingestion path. Neither flow module knows about
//! HTTP; `main.rs` is the only place that translates [`error::PipelineError`] into a status
//! code.

pub mod error;
pub mod ingest;
pub mod search;

pub use error::{ErrorClass, PipelineError};
pub use ingest::{ingest as ingest_record, IngestOutcome, RawRecordInput, RecordUpdate, UpdateError, apply_update};
pub use search::{search, SearchPipelineConfig, SearchRequest, SearchResponse, SearchResultItem};
