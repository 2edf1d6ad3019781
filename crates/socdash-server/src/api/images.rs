//! `POST /api/v1/images/rehost`.
//!
//! Unlike the stats routes this endpoint answers with a flat body:
//! `{ "url" }` on success, `{ "error", "details"? }` with status 400 on any
//! failure.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::AppState;

#[derive(Debug, Deserialize)]
struct RehostRequest {
    url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RehostSuccess {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub(super) struct RehostFailure {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RehostFailure {
    fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }
}

impl IntoResponse for RehostFailure {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

pub(super) async fn rehost_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<RehostSuccess>, RehostFailure> {
    let url = parse_rehost_request(&body)?;

    let Some(rehoster) = state.rehoster.as_deref() else {
        return Err(RehostFailure::new("image storage is not configured", None));
    };

    match rehoster.rehost(&url).await {
        Ok(url) => Ok(Json(RehostSuccess { url })),
        Err(e) => {
            let details = e.details();
            tracing::warn!(
                request_id = %req_id.0,
                error = %e,
                details = details.as_deref().unwrap_or(""),
                "rehost: request rejected"
            );
            Err(RehostFailure::new(e.to_string(), details))
        }
    }
}

pub(super) async fn rehost_preflight() -> StatusCode {
    StatusCode::OK
}

fn parse_rehost_request(body: &[u8]) -> Result<String, RehostFailure> {
    let request: RehostRequest = serde_json::from_slice(body)
        .map_err(|e| RehostFailure::new("Invalid JSON body", Some(e.to_string())))?;
    request
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| RehostFailure::new("URL is required", None))
}
