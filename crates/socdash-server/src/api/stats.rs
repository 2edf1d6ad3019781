use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use socdash_core::{MonthKey, MonthlyMetrics};
use socdash_stats::{SaveOutcome, SeriesPoint};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct MonthlyQuery {
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(super) struct MonthlySeries {
    pub year: i32,
    pub months: Vec<SeriesPoint>,
}

#[derive(Debug, Serialize)]
pub(super) struct CurrentMonth {
    pub month: MonthKey,
    #[serde(flatten)]
    pub metrics: MonthlyMetrics,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct SaveRequest {
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct SaveResult {
    pub month: MonthKey,
    pub outcome: SaveOutcome,
}

pub(super) async fn monthly_series(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<MonthlyQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<MonthlySeries>>, ApiError> {
    let Query(query) =
        query.map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.body_text()))?;

    let today = Utc::now().date_naive();
    let year = query.year.unwrap_or_else(|| today.year());
    if !(1..=9999).contains(&year) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "year must be between 1 and 9999",
        ));
    }

    let months = state.stats.build_series(today, year).await;

    Ok(Json(ApiResponse {
        data: MonthlySeries { year, months },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn current_month(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<CurrentMonth>>, ApiError> {
    let month = MonthKey::current();
    let Some(metrics) = state.stats.live_metrics(month).await else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            "no cached snapshot available",
        ));
    };

    Ok(Json(ApiResponse {
        data: CurrentMonth { month, metrics },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Run the debounced update now; `{"force": true}` bypasses the daily marker.
pub(super) async fn save_now(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> Result<Json<ApiResponse<SaveResult>>, ApiError> {
    let request = parse_save_request(&body).map_err(|e| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!("invalid request body: {e}"),
        )
    })?;

    let today = Utc::now().date_naive();
    let outcome = state.stats.update_if_due(today, request.force).await;
    if outcome == SaveOutcome::Failed {
        return Err(ApiError::new(
            req_id.0,
            "internal_error",
            "failed to save monthly statistics",
        ));
    }

    Ok(Json(ApiResponse {
        data: SaveResult {
            month: MonthKey::of(today),
            outcome,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// An empty body means "no options".
fn parse_save_request(body: &[u8]) -> Result<SaveRequest, serde_json::Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SaveRequest::default());
    }
    serde_json::from_slice(body)
}
