//! Embedding encoder (text → fixed-dimension float vector).
//!
//! [`sinter`] holds the actual GGUF transformer + stub backend; [`Encoder`] is the thin
//! public facade the rest of the pipeline talks to: it whitespace-normalizes input, always
//! returns an L2-normalized vector, and turns any encode-time failure into an empty vector
//! rather than propagating it, per the encoder's degrade-gracefully contract.

pub mod device;
mod error;
pub mod sinter;
pub mod utils;

pub use error::EmbeddingError;
pub use sinter::{SINTER_EMBEDDING_DIM, SINTER_MAX_SEQ_LEN, SinterConfig, SinterEmbedder};

use tracing::warn;

/// Text → vector encoder, backed by a loaded [`SinterEmbedder`].
#[derive(Debug)]
pub struct Encoder {
    embedder: SinterEmbedder,
}

impl Encoder {
    /// Loads an encoder from `config` (stub mode is supported; see [`SinterConfig::stub`]).
    pub fn load(config: SinterConfig) -> Result<Self, EmbeddingError> {
        Ok(Self {
            embedder: SinterEmbedder::load(config)?,
        })
    }

    /// Builds an encoder directly from an already-loaded embedder.
    pub fn from_embedder(embedder: SinterEmbedder) -> Self {
        Self { embedder }
    }

    /// Encodes `text` into an L2-normalized vector.
    ///
    /// Input is whitespace-normalized (runs of whitespace collapsed to a single space,
    /// surrounding whitespace trimmed) before encoding. On any encode failure this returns
    /// an empty vector instead of propagating the error — callers on the critical path
    /// (the query embed step) treat an empty vector as the failure signal themselves.
    pub fn encode(&self, text: &str) -> Vec<f32> {
        let normalized = normalize_whitespace(text);
        match self.embedder.embed(&normalized) {
            Ok(vector) => vector.into_iter().map(f32::from).collect(),
            Err(err) => {
                warn!(error = %err, "embedding encode failed, returning empty vector");
                Vec::new()
            }
        }
    }

    /// Encodes a batch of texts; each failure independently degrades to an empty vector.
    pub fn encode_batch(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }

    /// The configured output dimension.
    pub fn embedding_dim(&self) -> usize {
        self.embedder.embedding_dim()
    }

    /// `true` if this encoder is running in deterministic stub mode (no model loaded).
    pub fn is_stub(&self) -> bool {
        self.embedder.is_stub()
    }
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
