//! # codesearch
//!
//! The retrieval-and-ranking core of a RAG service over automation methods and test cases:
//! ingest raw method/test-case source, enrich and embed it into a multi-vector [`record`],
//! dedupe it against what's already stored, and serve natural-language queries against the
//! result with calibrated 0-100 confidence scores.
//!
//! ```text
//! query  → cache → normalize/expand/embed → ANN search → rescore → rerank → final rank → cache
//! ingest → enrich + embed → dedupe (summary → ANN → LLM verdict) → insert or skip
//! ```
//!
//! [`pipeline`] wires the component modules below into those two control flows; everything
//! else is an independently testable stage.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use codesearch::Config;
//!
//! # fn run() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! config.validate()?;
//! println!("Listening on {}", config.socket_addr());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Purpose |
//! |---------|---------|
//! | `cpu` | CPU-only inference (docs.rs default) |
//! | `metal` | Apple Silicon GPU acceleration |
//! | `cuda` | NVIDIA GPU acceleration |
//! | `mock` | Mock backends for tests/examples |
//!
//! ## Modules
//!
//! - [`cache`] - Result cache (C3)
//! - [`config`] - Environment-backed configuration (A1)
//! - [`dedupe`] - Dedupe pipeline (C9)
//! - [`embedding`] - Embedding encoder (C1)
//! - [`ingest`] - Ingestion enricher (C10)
//! - [`llm`] - LLM gateway (C2)
//! - [`pipeline`] - Query-path and ingest-path orchestration (A5's callees)
//! - [`query`] - Query preparer (C5)
//! - [`ranking`] - Final intent ranker (C8)
//! - [`record`] - Tagged Method/TestCase record model (A4)
//! - [`rerank`] - Pairwise reranker (C7)
//! - [`scoring`] - Candidate scorer (C6)
//! - [`vectordb`] - Vector store adapter (C4)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod cache;
pub mod config;
pub mod constants;
pub mod dedupe;
pub mod embedding;
pub mod hashing;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod query;
pub mod ranking;
pub mod record;
pub mod rerank;
pub mod scoring;
pub mod vectordb;

pub use api::{ApiError, AppState, router};
pub use cache::{ResultCache, ResultCacheLookup, canonical_key};
pub use config::{Config, ConfigError, PromptTemplates};
pub use constants::{DEFAULT_EMBEDDING_DIM, DimConfig, DimValidationError, validate_embedding_dim};
pub use dedupe::DedupeVerdict;
pub use embedding::{Encoder, EmbeddingError, SinterConfig};
pub use hashing::hash_prompt;
pub use ingest::{ComputedVectors, IngestError, MethodEnrichment, TestCaseEnrichment};
pub use llm::{GenaiClient, LlmClient, LlmError, LlmGateway};
#[cfg(any(test, feature = "mock"))]
pub use llm::MockLlmClient;
pub use pipeline::{
    ErrorClass, IngestOutcome, PipelineError, RawRecordInput, RecordUpdate, SearchPipelineConfig,
    SearchRequest, SearchResponse, SearchResultItem, UpdateError, apply_update, ingest_record,
    search,
};
pub use query::{QueryContext, QueryError, QueryFilters, QueryPreparer, RankingVariant};
pub use ranking::RankedItem;
pub use record::{Documentation, Record, RecordCore, RecordFlavor};
pub use rerank::rerank_stub;
pub use scoring::{Candidate, CandidateScorer, ScoringInput};
pub use vectordb::{
    MetadataFilter, QdrantClient, SearchHit, VectorDbClient, VectorDbError, VectorPoint,
    WriteConsistency,
};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockVectorDbClient;
