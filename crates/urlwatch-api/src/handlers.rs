//! REST API handlers.
//!
//! Each handler reads/writes via `StateStore` and returns JSON responses.
//! The scheduler never goes through this layer; it shares the store.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use urlwatch_state::*;

use crate::ApiState;

const DEFAULT_PAGE_LIMIT: usize = 100;
const DEFAULT_CHECKS_LIMIT: usize = 50;
const MAX_LIMIT: usize = 1000;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> axum::response::Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
        .into_response()
}

fn store_error(e: &StateError) -> axum::response::Response {
    warn!(error = %e, "store request failed");
    error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR)
}

/// A monitor as returned by the API.
#[derive(Debug, Serialize)]
pub struct MonitorResponse {
    #[serde(flatten)]
    pub monitor: Monitor,
    pub is_active: bool,
}

impl From<Monitor> for MonitorResponse {
    fn from(monitor: Monitor) -> Self {
        Self {
            is_active: monitor.is_active(),
            monitor,
        }
    }
}

/// Create request body.
#[derive(Debug, Deserialize)]
pub struct CreateMonitorRequest {
    pub url: String,
    pub check_interval: u32,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_page_limit")]
    pub limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct ChecksQuery {
    #[serde(default = "default_checks_limit")]
    pub limit: usize,
}

fn default_page_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

fn default_checks_limit() -> usize {
    DEFAULT_CHECKS_LIMIT
}

// ── Service ────────────────────────────────────────────────────

/// GET /
pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "URL Monitor Service" }))
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("ok")
}

// ── Monitors ───────────────────────────────────────────────────

/// GET /api/v1/monitors
pub async fn list_monitors(
    State(state): State<ApiState>,
    Query(page): Query<PageQuery>,
) -> impl IntoResponse {
    match state
        .store
        .list_monitors_page(page.skip, page.limit.min(MAX_LIMIT))
    {
        Ok(monitors) => {
            let monitors: Vec<MonitorResponse> = monitors.into_iter().map(Into::into).collect();
            ApiResponse::ok(monitors).into_response()
        }
        Err(e) => store_error(&e),
    }
}

/// POST /api/v1/monitors
pub async fn create_monitor(
    State(state): State<ApiState>,
    Json(req): Json<CreateMonitorRequest>,
) -> impl IntoResponse {
    match state.store.create_monitor(&req.url, req.check_interval) {
        Ok(monitor) => {
            info!(
                monitor_id = monitor.id,
                url = %monitor.url,
                check_interval = monitor.check_interval,
                "monitor registered"
            );
            (StatusCode::CREATED, ApiResponse::ok(MonitorResponse::from(monitor))).into_response()
        }
        Err(StateError::Invalid(e)) => {
            error_response(&e.to_string(), StatusCode::UNPROCESSABLE_ENTITY)
        }
        Err(e) => store_error(&e),
    }
}

/// GET /api/v1/monitors/:id
pub async fn get_monitor(
    State(state): State<ApiState>,
    Path(id): Path<MonitorId>,
) -> impl IntoResponse {
    match state.store.get_monitor(id) {
        Ok(Some(monitor)) => ApiResponse::ok(MonitorResponse::from(monitor)).into_response(),
        Ok(None) => error_response("monitor not found", StatusCode::NOT_FOUND),
        Err(e) => store_error(&e),
    }
}

/// DELETE /api/v1/monitors/:id
pub async fn delete_monitor(
    State(state): State<ApiState>,
    Path(id): Path<MonitorId>,
) -> impl IntoResponse {
    match state.store.deactivate_monitor(id) {
        Ok(true) => {
            info!(monitor_id = id, "monitor deactivated");
            ApiResponse::ok("Monitor deactivated").into_response()
        }
        Ok(false) => error_response("monitor not found", StatusCode::NOT_FOUND),
        Err(e) => store_error(&e),
    }
}

// ── Checks ─────────────────────────────────────────────────────

/// GET /api/v1/monitors/:id/checks
pub async fn list_checks(
    State(state): State<ApiState>,
    Path(id): Path<MonitorId>,
    Query(query): Query<ChecksQuery>,
) -> impl IntoResponse {
    match state.store.get_monitor(id) {
        Ok(Some(_)) => {}
        Ok(None) => return error_response("monitor not found", StatusCode::NOT_FOUND),
        Err(e) => return store_error(&e),
    }

    match state
        .store
        .list_recent_records(id, query.limit.min(MAX_LIMIT))
    {
        Ok(records) => ApiResponse::ok(records).into_response(),
        Err(e) => store_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use chrono::{TimeDelta, Utc};

    fn test_state() -> ApiState {
        let store = StateStore::open_in_memory().unwrap();
        ApiState { store }
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn create_req(url: &str, check_interval: u32) -> Json<CreateMonitorRequest> {
        Json(CreateMonitorRequest {
            url: url.to_string(),
            check_interval,
        })
    }

    fn page(skip: usize, limit: usize) -> Query<PageQuery> {
        Query(PageQuery { skip, limit })
    }

    #[tokio::test]
    async fn root_banner() {
        let resp = root().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["message"], "URL Monitor Service");
    }

    #[tokio::test]
    async fn list_monitors_empty() {
        let state = test_state();
        let resp = list_monitors(State(state), page(0, 100)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn create_and_get_monitor() {
        let state = test_state();

        let resp = create_monitor(State(state.clone()), create_req("https://example.com", 5))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body = body_json(resp).await;
        let id = body["data"]["id"].as_u64().unwrap();
        assert_eq!(body["data"]["check_interval"], 5);
        assert_eq!(body["data"]["is_active"], true);
        assert_eq!(body["data"]["status"], "active");

        let resp = get_monitor(State(state), Path(id)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["url"], "https://example.com/");
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_interval() {
        let state = test_state();
        for interval in [0, 4, 61] {
            let resp = create_monitor(State(state.clone()), create_req("https://example.com", interval))
                .await
                .into_response();
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
            let body = body_json(resp).await;
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().contains("interval"));
        }
        assert!(state.store.list_monitors(false).unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_bad_url() {
        let state = test_state();
        for url in ["", "not a url", "ftp://example.com"] {
            let resp = create_monitor(State(state.clone()), create_req(url, 10))
                .await
                .into_response();
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "url {url:?}");
        }
    }

    #[tokio::test]
    async fn get_nonexistent_monitor() {
        let state = test_state();
        let resp = get_monitor(State(state), Path(42)).await.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_deactivates_but_keeps_monitor() {
        let state = test_state();
        let m = state.store.create_monitor("https://example.com", 5).unwrap();

        let resp = delete_monitor(State(state.clone()), Path(m.id)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"], "Monitor deactivated");

        let resp = get_monitor(State(state), Path(m.id)).await.into_response();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["is_active"], false);
        assert_eq!(body["data"]["status"], "inactive");
    }

    #[tokio::test]
    async fn delete_nonexistent_monitor() {
        let state = test_state();
        let resp = delete_monitor(State(state), Path(7)).await.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_monitors_pages_by_id() {
        let state = test_state();
        for i in 0..5 {
            state
                .store
                .create_monitor(&format!("https://example.com/{i}"), 5)
                .unwrap();
        }
        state.store.deactivate_monitor(1).unwrap();

        let resp = list_monitors(State(state.clone()), page(0, 100)).await.into_response();
        let body = body_json(resp).await;
        // Inactive monitors are listed too.
        assert_eq!(body["data"].as_array().unwrap().len(), 5);

        let resp = list_monitors(State(state), page(1, 2)).await.into_response();
        let body = body_json(resp).await;
        let ids: Vec<u64> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_u64().unwrap())
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn list_checks_most_recent_first() {
        let state = test_state();
        let m = state.store.create_monitor("https://example.com", 5).unwrap();
        let t0 = Utc::now();
        for (i, code) in [200u16, 503, 200].into_iter().enumerate() {
            state
                .store
                .append_record(NewHealthRecord::response(
                    m.id,
                    code,
                    12.5,
                    t0 + TimeDelta::minutes(5 * i as i64),
                ))
                .unwrap();
        }

        let resp = list_checks(State(state.clone()), Path(m.id), Query(ChecksQuery { limit: 2 }))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        let records = body["data"].as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["status_code"], 200);
        assert_eq!(records[1]["status_code"], 503);
        assert_eq!(records[1]["is_up"], false);
    }

    #[tokio::test]
    async fn list_checks_unknown_monitor() {
        let state = test_state();
        let resp = list_checks(State(state), Path(9), Query(ChecksQuery { limit: 50 }))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = body_json(resp).await;
        assert_eq!(body["error"], "monitor not found");
    }

    #[tokio::test]
    async fn list_checks_known_monitor_without_history() {
        let state = test_state();
        let m = state.store.create_monitor("https://example.com", 5).unwrap();
        let resp = list_checks(State(state), Path(m.id), Query(ChecksQuery { limit: 50 }))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"], serde_json::json!([]));
    }
}
