//! The ambient HTTP surface: a thin Axum router exposing `/healthz`, `/ready`, `/search`,
//! and `/ingest` for a host application to mount. It owns none of the auth, routing, or
//! request-validation middleware a host wraps around it — only wiring the pipeline.

pub mod error;
pub mod handler;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::llm::LlmClient;
use crate::vectordb::VectorDbClient;

/// Builds the router for the given [`AppState`].
pub fn router<C, V>(state: AppState<C, V>) -> Router
where
    C: LlmClient + Send + Sync + 'static,
    V: VectorDbClient + Send + Sync + 'static,
{
    Router::new()
        .route("/healthz", get(handler::health_handler))
        .route("/ready", get(handler::ready_handler::<C, V>))
        .route("/search", post(handler::search_handler::<C, V>))
        .route("/ingest", post(handler::ingest_handler::<C, V>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::embedding::{Encoder, SinterConfig};
    use crate::llm::MockLlmClient;
    use crate::vectordb::MockVectorDbClient;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> AppState<MockLlmClient, MockVectorDbClient> {
        let encoder = Encoder::load(SinterConfig::stub()).unwrap();
        let store = MockVectorDbClient::new();
        AppState::new(encoder, None, store, Config::default())
    }

    #[tokio::test]
    async fn healthz_returns_200() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn ready_returns_200() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn search_with_empty_query_returns_400() {
        let app = router(test_state());
        let body = serde_json::json!({ "query": "" }).to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/search")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
