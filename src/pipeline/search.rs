//! The query path: Result Cache → Query Preparer → Vector Store Adapter → Candidate Scorer
//! → Pairwise Reranker → Final Intent Ranker → Result Cache populate.
//!
//! This is the "control flow" glue the individual component modules (`query`, `scoring`,
//! `rerank`, `ranking`, `vectordb`, `cache`) deliberately don't know about each other.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{ResultCache, ResultCacheLookup, canonical_key};
use crate::config::PromptTemplates;
use crate::embedding::Encoder;
use crate::llm::{LlmClient, LlmGateway};
use crate::query::{QueryFilters, QueryPreparer, RankingVariant};
use crate::ranking::{self, RankedItem};
use crate::record::Record;
use crate::rerank;
use crate::scoring::{CandidateScorer, ScoringInput};
use crate::vectordb::{MetadataFilter, VectorDbClient};

use super::error::PipelineError;

/// A single search request, as received at the external interface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub feature: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    /// `"A"` or `"B"`; defaults to `A` when absent.
    #[serde(default)]
    pub ranking_variant: Option<String>,
}

/// A single record surfaced in a [`SearchResponse`]. Vectors never appear here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResultItem {
    pub id: String,
    pub probability: f32,
    pub name: String,
    pub description: String,
    /// Steps (test case) or raw body (method).
    pub steps_or_body: String,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub platform: Option<String>,
}

/// A fully materialized search response; this is exactly what gets cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResponse {
    pub query: String,
    pub feature_filter: Option<String>,
    pub results_count: usize,
    pub results: Vec<SearchResultItem>,
    pub from_cache: bool,
    pub ranking_variant: String,
}

/// Tunables the search pipeline needs beyond what an individual stage already owns.
pub struct SearchPipelineConfig<'a> {
    pub collection: &'a str,
    pub candidates_to_retrieve: usize,
    pub final_results: usize,
    pub top_k: usize,
    pub rerank_enabled: bool,
    pub normalize_enabled: bool,
    pub expansion_enabled: bool,
    pub query_expansions: usize,
    pub prompts: &'a PromptTemplates,
}

struct DisplayMeta {
    tags: Vec<String>,
    priority: Option<String>,
    platform: Option<String>,
}

/// Runs the full query path: cache check, prepare, ANN search, score, rerank, final-rank,
/// cache populate.
pub async fn search<C: LlmClient, V: VectorDbClient>(
    request: SearchRequest,
    encoder: &Encoder,
    gateway: Option<&LlmGateway<C>>,
    store: &V,
    cache: &ResultCache,
    cfg: SearchPipelineConfig<'_>,
) -> Result<SearchResponse, PipelineError> {
    let variant = match request.ranking_variant.as_deref() {
        Some(v) => v.parse::<RankingVariant>().map_err(PipelineError::from)?,
        None => RankingVariant::default(),
    };

    let filters = QueryFilters {
        feature: request.feature.clone(),
        tags: request.tags.clone(),
        priority: request.priority.clone(),
        platform: request.platform.clone(),
    };

    let cache_key = canonical_key(&request.query, &filters.repr(), variant.as_str());

    if let ResultCacheLookup::Hit(bytes) = cache.get(&cache_key) {
        if let Ok(mut response) = serde_json::from_slice::<SearchResponse>(&bytes) {
            debug!(query = %request.query, "result cache hit");
            response.from_cache = true;
            return Ok(response);
        }
    }

    let preparer = QueryPreparer::new(
        encoder,
        gateway,
        &cfg.prompts.normalize,
        &cfg.prompts.expand,
        cfg.query_expansions,
        cfg.normalize_enabled,
        cfg.expansion_enabled,
    );
    let ctx = preparer
        .prepare(&request.query, filters.clone(), variant)
        .await?;

    let vector_filter = filters
        .feature
        .as_ref()
        .map(|f| MetadataFilter::new("feature", f.clone()));

    let hits = store
        .search(
            cfg.collection,
            ctx.combined_vector.clone(),
            cfg.candidates_to_retrieve as u64,
            vector_filter,
        )
        .await?;

    let scoring_inputs: Vec<ScoringInput> = hits
        .into_iter()
        .filter_map(|hit| {
            serde_json::from_value::<Record>(hit.document)
                .ok()
                .map(|record| ScoringInput {
                    id: hit.id,
                    ann_score: hit.score,
                    record,
                })
        })
        .collect();

    let expansion_tokens = tokenize_expansions(&ctx.expansions);

    let scorer = CandidateScorer::new(cfg.candidates_to_retrieve);
    let candidates = scorer.score(&ctx.combined_vector, &expansion_tokens, variant, scoring_inputs);

    let candidates = apply_request_filters(candidates, &filters);

    let reranked = rerank::rerank(
        &request.query,
        candidates,
        gateway,
        cfg.rerank_enabled,
        &cfg.prompts.rerank,
    )
    .await;

    let mut display: Vec<_> = reranked;
    display.truncate(cfg.final_results);

    let mut meta: HashMap<String, DisplayMeta> = HashMap::with_capacity(display.len());
    let items: Vec<RankedItem> = display
        .into_iter()
        .map(|c| {
            let flavor = &c.record.flavor;
            meta.insert(
                c.id.clone(),
                DisplayMeta {
                    tags: flavor.tags().to_vec(),
                    priority: flavor.priority().map(str::to_string),
                    platform: flavor.platform().map(str::to_string),
                },
            );
            RankedItem {
                id: c.id,
                name: c.record.core.name,
                description: c.record.core.documentation.description,
                steps_or_body: c.record.core.body,
                keywords: c.record.core.documentation.keywords,
                probability: None,
            }
        })
        .collect();

    let ranked = ranking::rank(items, cfg.top_k, gateway, &cfg.prompts.final_rank).await;

    let results: Vec<SearchResultItem> = ranked
        .into_iter()
        .map(|item| {
            let extra = meta.remove(&item.id);
            SearchResultItem {
                id: item.id,
                probability: item.probability.unwrap_or(0.0),
                name: item.name,
                description: item.description,
                steps_or_body: item.steps_or_body,
                keywords: item.keywords,
                tags: extra.as_ref().map(|m| m.tags.clone()).unwrap_or_default(),
                priority: extra.as_ref().and_then(|m| m.priority.clone()),
                platform: extra.as_ref().and_then(|m| m.platform.clone()),
            }
        })
        .collect();

    let response = SearchResponse {
        query: request.query.clone(),
        feature_filter: filters.feature.clone(),
        results_count: results.len(),
        results,
        from_cache: false,
        ranking_variant: variant.as_str().to_string(),
    };

    if let Ok(bytes) = serde_json::to_vec(&response) {
        cache.set(&cache_key, bytes);
    }

    Ok(response)
}

fn apply_request_filters(
    candidates: Vec<crate::scoring::Candidate>,
    filters: &QueryFilters,
) -> Vec<crate::scoring::Candidate> {
    if filters.tags.is_empty() && filters.priority.is_none() && filters.platform.is_none() {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|c| {
            let flavor = &c.record.flavor;

            let tags_ok = filters
                .tags
                .iter()
                .all(|t| flavor.tags().iter().any(|ct| ct.eq_ignore_ascii_case(t)));

            let priority_ok = filters
                .priority
                .as_deref()
                .is_none_or(|p| flavor.priority().is_some_and(|cp| cp.eq_ignore_ascii_case(p)));

            let platform_ok = filters
                .platform
                .as_deref()
                .is_none_or(|p| flavor.platform().is_some_and(|cp| cp.eq_ignore_ascii_case(p)));

            tags_ok && priority_ok && platform_ok
        })
        .collect()
}

fn tokenize_expansions(expansions: &[String]) -> Vec<String> {
    let pattern = regex::Regex::new(r"\b[\w\-']+\b").expect("static token pattern is valid");
    let mut seen = std::collections::HashSet::new();
    let mut tokens = Vec::new();
    for expansion in expansions {
        for m in pattern.find_iter(&expansion.to_lowercase()) {
            let token = m.as_str().to_string();
            if seen.insert(token.clone()) {
                tokens.push(token);
            }
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::SinterConfig;
    use crate::llm::MockLlmClient;
    use crate::record::{Documentation, RecordCore, RecordFlavor};
    use crate::vectordb::{MockVectorDbClient, VectorPoint, WriteConsistency};
    use chrono::Utc;
    use std::time::Duration;

    fn gateway(mock: MockLlmClient) -> LlmGateway<MockLlmClient> {
        LlmGateway::new(mock, "test-model", 4, 0, Duration::from_millis(1))
    }

    fn method_record(id: &str, summary: &str, vec: Vec<f32>) -> Record {
        Record {
            core: RecordCore {
                id: id.to_string(),
                name: format!("method_{id}"),
                body: "driver.click(submit);".into(),
                documentation: Documentation {
                    summary: summary.to_string(),
                    description: format!("Does {summary}"),
                    ..Default::default()
                },
                created: Utc::now(),
                last_updated: Utc::now(),
                summary_vec: vec.clone(),
                body_vec: vec.clone(),
                doc_vec: vec.clone(),
                main_vec: vec,
            },
            flavor: RecordFlavor::Method {
                applies: None,
                returns: None,
                example_usage: None,
                owner: None,
            },
        }
    }

    async fn seeded_store(encoder: &Encoder) -> MockVectorDbClient {
        let store = MockVectorDbClient::new();
        store.ensure_collection("records", encoder.embedding_dim() as u64).await.unwrap();
        for (id, text) in [("r1", "click submit button"), ("r2", "press cancel button"), ("r3", "open settings menu")] {
            let record = method_record(id, text, encoder.encode(text));
            let doc = serde_json::to_value(&record).unwrap();
            store
                .upsert_points("records", vec![VectorPoint::new(id, encoder.encode(text), doc)], WriteConsistency::Strong)
                .await
                .unwrap();
        }
        store
    }

    fn cfg<'a>(prompts: &'a PromptTemplates) -> SearchPipelineConfig<'a> {
        SearchPipelineConfig {
            collection: "records",
            candidates_to_retrieve: 15,
            final_results: 5,
            top_k: 3,
            rerank_enabled: true,
            normalize_enabled: true,
            expansion_enabled: true,
            query_expansions: 6,
            prompts,
        }
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_touching_the_store() {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let store = seeded_store(&encoder).await;
        let cache = ResultCache::new(Duration::from_secs(300));
        let prompts = PromptTemplates::default();
        let request = SearchRequest {
            query: "   ".into(),
            ..Default::default()
        };
        let err = search::<MockLlmClient, _>(request, &encoder, None, &store, &cache, cfg(&prompts))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Search query cannot be empty.");
    }

    #[tokio::test]
    async fn search_without_llm_returns_ranked_results() {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let store = seeded_store(&encoder).await;
        let cache = ResultCache::new(Duration::from_secs(300));
        let prompts = PromptTemplates::default();
        let request = SearchRequest {
            query: "click submit button".into(),
            ..Default::default()
        };
        let response = search::<MockLlmClient, _>(request, &encoder, None, &store, &cache, cfg(&prompts))
            .await
            .unwrap();
        assert!(!response.from_cache);
        assert!(response.results_count > 0);
        assert_eq!(response.results[0].id, "r1");
    }

    #[tokio::test]
    async fn second_identical_request_hits_cache() {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let store = seeded_store(&encoder).await;
        let cache = ResultCache::new(Duration::from_secs(300));
        let prompts = PromptTemplates::default();
        let request = || SearchRequest {
            query: "click submit button".into(),
            ..Default::default()
        };

        let first = search::<MockLlmClient, _>(request(), &encoder, None, &store, &cache, cfg(&prompts))
            .await
            .unwrap();
        let second = search::<MockLlmClient, _>(request(), &encoder, None, &store, &cache, cfg(&prompts))
            .await
            .unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.results, second.results);
    }

    #[tokio::test]
    async fn no_ann_hits_yields_empty_but_valid_response() {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let store = MockVectorDbClient::new();
        store.ensure_collection("records", encoder.embedding_dim() as u64).await.unwrap();
        let cache = ResultCache::new(Duration::from_secs(300));
        let prompts = PromptTemplates::default();
        let request = SearchRequest {
            query: "anything at all".into(),
            ..Default::default()
        };
        let response = search::<MockLlmClient, _>(request, &encoder, None, &store, &cache, cfg(&prompts))
            .await
            .unwrap();
        assert_eq!(response.results_count, 0);
        assert!(response.results.is_empty());
    }

    #[tokio::test]
    async fn final_ranker_scores_show_up_on_results() {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let store = seeded_store(&encoder).await;
        let cache = ResultCache::new(Duration::from_secs(300));
        let prompts = PromptTemplates::default();
        let mock = MockLlmClient::new();
        mock.push_text("click submit button");
        mock.push_text("click submit button");
        mock.push_text("r1\nr2\nr3");
        mock.push_text("r1 | 92\nr2 | 80\nr3 | 55");
        let gw = gateway(mock);
        let request = SearchRequest {
            query: "clikc submit buton".into(),
            ..Default::default()
        };
        let response = search(request, &encoder, Some(&gw), &store, &cache, cfg(&prompts))
            .await
            .unwrap();
        assert_eq!(
            response.results.iter().map(|r| r.probability).collect::<Vec<_>>(),
            vec![92.0, 80.0, 55.0]
        );
    }
}
