//! Maps [`PipelineError`] onto HTTP responses, attaching `X-Search-Status` so operators can
//! see the failure class without parsing the body, per the teacher's `REFLEX_STATUS_HEADER`
//! convention.

use axum::Json;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::cache::SEARCH_STATUS_HEADER;
use crate::pipeline::{ErrorClass, PipelineError};

/// The HTTP-boundary error type; every handler returns `Result<_, ApiError>`.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, status_tag) = match self.0.class() {
            ErrorClass::BadRequest => (StatusCode::BAD_REQUEST, "invalid_request"),
            ErrorClass::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            SEARCH_STATUS_HEADER,
            HeaderValue::from_static(status_tag),
        );

        let body = Json(ErrorBody {
            error: self.0.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
