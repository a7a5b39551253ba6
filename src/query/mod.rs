//! Query preparation: normalize, expand, and embed a raw user query into a [`QueryContext`]
//! ready for the vector store and scorer.

pub mod error;

pub use error::QueryError;

use tracing::{debug, warn};

use crate::embedding::{Encoder, SinterConfig};
use crate::llm::{LlmClient, LlmGateway};

/// Which candidate-scoring formula a request selects; see [`crate::scoring`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingVariant {
    #[default]
    A,
    B,
}

impl RankingVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingVariant::A => "A",
            RankingVariant::B => "B",
        }
    }
}

impl std::str::FromStr for RankingVariant {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" | "a" => Ok(RankingVariant::A),
            "B" | "b" => Ok(RankingVariant::B),
            other => Err(QueryError::InvalidVariant {
                value: other.to_string(),
            }),
        }
    }
}

/// Metadata filter applied at the vector-store boundary; `None` means unfiltered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryFilters {
    pub feature: Option<String>,
    pub tags: Vec<String>,
    pub priority: Option<String>,
    pub platform: Option<String>,
}

impl QueryFilters {
    /// The stable string representation folded into the cache key; see
    /// [`crate::cache::canonical_key`].
    pub fn repr(&self) -> String {
        let mut tags = self.tags.clone();
        tags.sort();
        format!(
            "feature={}|tags={}|priority={}|platform={}",
            self.feature.as_deref().unwrap_or(""),
            tags.join(","),
            self.priority.as_deref().unwrap_or(""),
            self.platform.as_deref().unwrap_or(""),
        )
    }
}

/// The product of query preparation: everything downstream stages need, with no further
/// dependency on the raw request.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub raw_query: String,
    pub normalized_query: String,
    pub expansions: Vec<String>,
    pub combined_vector: Vec<f32>,
    pub filters: QueryFilters,
    pub variant: RankingVariant,
}

/// Normalizes, expands and embeds a raw query. `llm` is optional: when `None` or when
/// `query_expansion_enabled`/normalization is turned off in config, steps 1-2 degrade to
/// their identity fallback per the component contract.
pub struct QueryPreparer<'a, C: LlmClient> {
    encoder: &'a Encoder,
    gateway: Option<&'a LlmGateway<C>>,
    normalize_prompt: &'a str,
    expand_prompt: &'a str,
    query_expansions: usize,
    normalize_enabled: bool,
    expansion_enabled: bool,
}

impl<'a, C: LlmClient> QueryPreparer<'a, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        encoder: &'a Encoder,
        gateway: Option<&'a LlmGateway<C>>,
        normalize_prompt: &'a str,
        expand_prompt: &'a str,
        query_expansions: usize,
        normalize_enabled: bool,
        expansion_enabled: bool,
    ) -> Self {
        Self {
            encoder,
            gateway,
            normalize_prompt,
            expand_prompt,
            query_expansions,
            normalize_enabled,
            expansion_enabled,
        }
    }

    pub async fn prepare(
        &self,
        raw_query: &str,
        filters: QueryFilters,
        variant: RankingVariant,
    ) -> Result<QueryContext, QueryError> {
        let trimmed = raw_query.trim();
        if trimmed.is_empty() {
            return Err(QueryError::EmptyQuery);
        }

        let normalized_query = self.normalize(trimmed).await;
        let expansions = self.expand(&normalized_query).await;

        let combined_text = expansions.join(" ");
        let combined_vector = self.encoder.encode(&combined_text);
        if combined_vector.is_empty() {
            return Err(QueryError::EmbeddingFailed);
        }

        Ok(QueryContext {
            raw_query: raw_query.to_string(),
            normalized_query,
            expansions,
            combined_vector,
            filters,
            variant,
        })
    }

    async fn normalize(&self, query: &str) -> String {
        if !self.normalize_enabled {
            return query.to_string();
        }
        let Some(gateway) = self.gateway else {
            return query.to_string();
        };

        let prompt = self.normalize_prompt.replace("{query}", query);
        match gateway.generate(&prompt).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    query.to_string()
                } else {
                    text.to_string()
                }
            }
            Err(e) => {
                warn!(error = %e, "query normalization failed, using original query");
                query.to_string()
            }
        }
    }

    async fn expand(&self, normalized: &str) -> Vec<String> {
        let fallback = vec![normalized.to_string()];

        if !self.expansion_enabled {
            return fallback;
        }
        let Some(gateway) = self.gateway else {
            return fallback;
        };

        let prompt = self
            .expand_prompt
            .replace("{query}", normalized)
            .replace("{count}", &self.query_expansions.to_string());

        let raw = match gateway.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "query expansion failed, using normalized query only");
                return fallback;
            }
        };

        let mut expansions = vec![normalized.to_string()];
        let mut seen = std::collections::HashSet::new();
        seen.insert(normalized.to_lowercase());

        for candidate in Self::split_expansions(&raw) {
            let key = candidate.to_lowercase();
            if seen.insert(key) {
                expansions.push(candidate);
            }
            if expansions.len() >= self.query_expansions {
                break;
            }
        }

        debug!(count = expansions.len(), "query expanded");
        expansions.truncate(self.query_expansions);
        expansions
    }

    fn split_expansions(raw: &str) -> Vec<String> {
        raw.split([',', '\n'])
            .map(Self::strip_numbering)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn strip_numbering(s: &str) -> &str {
        let trimmed = s.trim_start();
        let digits_end = trimmed
            .char_indices()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(i, c)| i + c.len_utf8());
        match digits_end {
            Some(end) => {
                let rest = &trimmed[end..];
                let rest = rest.trim_start_matches(['.', ')', ':', '-']);
                if rest.len() < trimmed.len() { rest } else { trimmed }
            }
            None => trimmed,
        }
    }
}
