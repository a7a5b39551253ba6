//! Thin Axum handlers: each one builds a [`SearchPipelineConfig`]/calls straight into
//! [`crate::pipeline`] and converts the result. No routing/auth/validation logic beyond
//! JSON (de)serialization lives here, per the minimal host-mountable surface this crate
//! exposes.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use crate::cache::{SEARCH_STATUS_ERROR, SEARCH_STATUS_HEADER, SEARCH_STATUS_READY};
use crate::llm::LlmClient;
use crate::pipeline::{self, IngestOutcome, RawRecordInput, SearchPipelineConfig, SearchRequest};
use crate::vectordb::VectorDbClient;

use super::error::ApiError;
use super::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(SEARCH_STATUS_HEADER, HeaderValue::from_static(SEARCH_STATUS_READY));
    (StatusCode::OK, headers, Json(HealthResponse { status: "ok" })).into_response()
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(Serialize)]
pub struct ComponentStatus {
    pub embedding: &'static str,
    pub vectordb: &'static str,
    pub cache: &'static str,
}

#[instrument(skip(state))]
pub async fn ready_handler<C, V>(State(state): State<AppState<C, V>>) -> Response
where
    C: LlmClient + Send + Sync + 'static,
    V: VectorDbClient + Send + Sync + 'static,
{
    let embedding_status = if state.encoder.is_stub() { "stub" } else { "ready" };
    let components = ComponentStatus {
        embedding: embedding_status,
        vectordb: SEARCH_STATUS_READY,
        cache: SEARCH_STATUS_READY,
    };

    let mut headers = HeaderMap::new();
    headers.insert(SEARCH_STATUS_HEADER, HeaderValue::from_static(SEARCH_STATUS_READY));

    (
        StatusCode::OK,
        headers,
        Json(ReadyResponse {
            status: "ok",
            components,
        }),
    )
        .into_response()
}

#[instrument(skip(state, request), fields(query = %request.query))]
pub async fn search_handler<C, V>(
    State(state): State<AppState<C, V>>,
    Json(request): Json<SearchRequest>,
) -> Result<Response, ApiError>
where
    C: LlmClient + Send + Sync + 'static,
    V: VectorDbClient + Send + Sync + 'static,
{
    let cfg = SearchPipelineConfig {
        collection: &state.collection,
        candidates_to_retrieve: state.config.candidates_to_retrieve,
        final_results: state.config.final_results,
        top_k: state.config.top_k,
        rerank_enabled: state.config.llm_rerank_enabled,
        normalize_enabled: true,
        expansion_enabled: state.config.query_expansion_enabled,
        query_expansions: state.config.query_expansions,
        prompts: &state.config.prompts,
    };

    let response = pipeline::search(
        request,
        &state.encoder,
        state.gateway.as_deref(),
        state.store.as_ref(),
        &state.cache,
        cfg,
    )
    .await?;

    let mut headers = HeaderMap::new();
    let status_tag = if response.from_cache {
        "cache_hit"
    } else {
        SEARCH_STATUS_READY
    };
    headers.insert(
        SEARCH_STATUS_HEADER,
        HeaderValue::from_str(status_tag).unwrap_or(HeaderValue::from_static(SEARCH_STATUS_ERROR)),
    );

    Ok((StatusCode::OK, headers, Json(response)).into_response())
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub inserted: usize,
    pub outcome: &'static str,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_id: Option<String>,
}

#[instrument(skip(state, input))]
pub async fn ingest_handler<C, V>(
    State(state): State<AppState<C, V>>,
    Json(input): Json<RawRecordInput>,
) -> Result<Json<IngestResponse>, ApiError>
where
    C: LlmClient + Send + Sync + 'static,
    V: VectorDbClient + Send + Sync + 'static,
{
    let outcome = pipeline::ingest_record(
        input,
        &state.encoder,
        state.gateway.as_deref(),
        state.store.as_ref(),
        &state.collection,
        &state.config.prompts,
        Utc::now(),
    )
    .await
    .map_err(ApiError::from)?;

    let response = match outcome {
        IngestOutcome::Inserted { record } => IngestResponse {
            inserted: 1,
            outcome: "inserted",
            id: record.core.id,
            matched_id: None,
        },
        IngestOutcome::SkippedDuplicate { id, matched_id } => IngestResponse {
            inserted: 0,
            outcome: "skipped_duplicate",
            id,
            matched_id,
        },
    };

    Ok(Json(response))
}
