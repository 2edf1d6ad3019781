mod images;
mod stats;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use socdash_rehost::ImageRehoster;
use socdash_stats::StatsAggregator;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub stats: Arc<StatsAggregator>,
    /// `None` when object storage is not configured.
    pub rehoster: Option<Arc<ImageRehoster>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/stats/monthly", get(stats::monthly_series))
        .route("/api/v1/stats/current", get(stats::current_month))
        .route("/api/v1/stats/save", post(stats::save_now))
        .route(
            "/api/v1/images/rehost",
            post(images::rehost_image).options(images::rehost_preflight),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match socdash_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use socdash_core::MonthKey;
    use socdash_rehost::{ObjectStore, RehostConfig, StorageClient};
    use tower::ServiceExt;
    use wiremock::matchers::{any, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::middleware::REQUEST_ID_HEADER;
    use crate::test_support::{app_state, snapshot_json};

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).expect("json parse")
        };
        (status, json)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    fn post_req(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .expect("request")
    }

    fn rehoster_against(storage: &MockServer) -> Arc<ImageRehoster> {
        let store = StorageClient::new(&storage.uri(), "service-key", 5, "socdash-test/0.1")
            .expect("storage client");
        let rehoster = ImageRehoster::new(
            Arc::new(store) as Arc<dyn ObjectStore>,
            RehostConfig::default(),
        )
        .expect("rehoster");
        Arc::new(rehoster)
    }

    // -------------------------------------------------------------------------
    // Envelope and middleware
    // -------------------------------------------------------------------------

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("not_found", StatusCode::NOT_FOUND),
            ("validation_error", StatusCode::BAD_REQUEST),
            ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, expected) in cases {
            let response = ApiError::new("req-1", code, "msg").into_response();
            assert_eq!(response.status(), expected, "code {code}");
        }
    }

    #[tokio::test]
    async fn health_reports_degraded_when_database_is_unreachable() {
        let (state, _) = app_state(None, None);
        let request = Request::builder()
            .uri("/api/v1/health")
            .header(REQUEST_ID_HEADER, "req-health")
            .body(Body::empty())
            .expect("request");

        let response = build_app(state).oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("req-health")
        );
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&body).expect("json parse");
        assert_eq!(json["data"]["database"], "unavailable");
        assert_eq!(json["meta"]["request_id"], "req-health");
    }

    // -------------------------------------------------------------------------
    // Stats
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn monthly_series_has_twelve_entries_with_live_current_month() {
        let current = MonthKey::current();
        let (state, _) = app_state(Some(snapshot_json(current)), None);

        let (status, json) = send(
            build_app(state),
            get_req(&format!("/api/v1/stats/monthly?year={}", current.year())),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let months = json["data"]["months"].as_array().expect("months array");
        assert_eq!(months.len(), 12);
        let idx = usize::try_from(current.month() - 1).expect("index");
        assert_eq!(months[idx]["month"], current.first_day().to_string());
        assert_eq!(months[idx]["source"], "live");
        assert_eq!(months[idx]["instagram_followers"], 1200);
        assert_eq!(months[idx]["instagram_likes"], 30);
    }

    #[tokio::test]
    async fn monthly_series_rejects_bad_year() {
        let (state, _) = app_state(None, None);
        let app = build_app(state);

        for uri in [
            "/api/v1/stats/monthly?year=abc",
            "/api/v1/stats/monthly?year=0",
        ] {
            let (status, json) = send(app.clone(), get_req(uri)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(json["error"]["code"], "validation_error", "{uri}");
        }
    }

    #[tokio::test]
    async fn current_month_is_not_found_without_snapshot() {
        let (state, _) = app_state(None, None);
        let (status, json) = send(build_app(state), get_req("/api/v1/stats/current")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn current_month_returns_live_totals() {
        let current = MonthKey::current();
        let (state, _) = app_state(Some(snapshot_json(current)), None);

        let (status, json) = send(build_app(state), get_req("/api/v1/stats/current")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["facebook_followers"], 300);
        assert_eq!(json["data"]["facebook_likes"], 4);
        assert_eq!(json["data"]["linkedin_likes"], 2);
    }

    #[tokio::test]
    async fn save_is_debounced_unless_forced() {
        let (state, store) = app_state(Some(snapshot_json(MonthKey::current())), None);
        let app = build_app(state);

        let (status, json) = send(app.clone(), post_req("/api/v1/stats/save", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["outcome"], "saved");

        let (_, json) = send(app.clone(), post_req("/api/v1/stats/save", "{}")).await;
        assert_eq!(json["data"]["outcome"], "already_saved_today");

        let (_, json) = send(app, post_req("/api/v1/stats/save", r#"{"force":true}"#)).await;
        assert_eq!(json["data"]["outcome"], "saved");

        assert_eq!(store.writes(), 2);
    }

    #[tokio::test]
    async fn save_rejects_malformed_body() {
        let (state, store) = app_state(Some(snapshot_json(MonthKey::current())), None);
        let (status, json) = send(
            build_app(state),
            post_req("/api/v1/stats/save", r#"{"force":"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
        assert_eq!(store.writes(), 0);
    }

    // -------------------------------------------------------------------------
    // Image rehost
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn rehost_rejects_non_json_body() {
        let (state, _) = app_state(None, None);
        let (status, json) = send(
            build_app(state),
            post_req("/api/v1/images/rehost", "url=https://x"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid JSON body");
        assert!(json["details"].is_string());
    }

    #[tokio::test]
    async fn rehost_requires_url_field() {
        let (state, _) = app_state(None, None);
        let (status, json) = send(
            build_app(state),
            post_req("/api/v1/images/rehost", r#"{"href":"https://x"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "URL is required");
    }

    #[tokio::test]
    async fn rehost_reports_unconfigured_storage() {
        let (state, _) = app_state(None, None);
        let (status, json) = send(
            build_app(state),
            post_req(
                "/api/v1/images/rehost",
                r#"{"url":"https://cdn.example.com/a.png"}"#,
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "image storage is not configured");
    }

    #[tokio::test]
    async fn rehost_rejects_invalid_url_without_storage_calls() {
        let storage = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&storage)
            .await;

        let (state, _) = app_state(None, Some(rehoster_against(&storage)));
        let (status, json) = send(
            build_app(state),
            post_req("/api/v1/images/rehost", r#"{"url":"not-a-url"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid URL provided");
    }

    #[tokio::test]
    async fn rehost_rejects_html_without_upload() {
        let upstream = MockServer::start().await;
        let storage = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&upstream)
            .await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&storage)
            .await;

        let (state, _) = app_state(None, Some(rehoster_against(&storage)));
        let body = json!({ "url": format!("{}/page", upstream.uri()) }).to_string();
        let (status, json) = send(build_app(state), post_req("/api/v1/images/rehost", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "URL does not point to an image");
    }

    #[tokio::test]
    async fn rehost_returns_public_url_for_small_image() {
        let upstream = MockServer::start().await;
        let storage = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logo.webp"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1_u8; 256], "image/webp"))
            .mount(&upstream)
            .await;
        Mock::given(method("GET"))
            .and(path("/storage/v1/bucket"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "name": "rehosted-images" }])),
            )
            .mount(&storage)
            .await;
        Mock::given(method("POST"))
            .and(path_regex(r"^/storage/v1/object/rehosted-images/.+\.webp$"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&storage)
            .await;

        let (state, _) = app_state(None, Some(rehoster_against(&storage)));
        let body = json!({ "url": format!("{}/logo.webp", upstream.uri()) }).to_string();
        let (status, json) = send(build_app(state), post_req("/api/v1/images/rehost", body)).await;

        assert_eq!(status, StatusCode::OK);
        let url = json["url"].as_str().expect("url string");
        assert!(url.starts_with(&storage.uri()), "unexpected url: {url}");
        assert!(url.ends_with(".webp"), "unexpected url: {url}");
    }

    #[tokio::test]
    async fn rehost_options_returns_empty_ok_with_cors_headers() {
        let (state, _) = app_state(None, None);
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/images/rehost")
            .header(header::ORIGIN, "https://dashboard.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(
                header::ACCESS_CONTROL_REQUEST_HEADERS,
                "authorization, x-client-info, apikey, content-type",
            )
            .body(Body::empty())
            .expect("request");

        let response = build_app(state).oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        assert!(body.is_empty());
    }
}
