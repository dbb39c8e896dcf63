//! Shared fixtures: a local HTTP target and polling helpers.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use urlwatch_state::{HealthRecord, HealthRecordStore, MonitorId, StateStore};

/// Delay of the `/slow` route.
pub const SLOW_DELAY: Duration = Duration::from_millis(400);

/// Start a target server on an ephemeral port and return its address.
pub async fn spawn_target() -> SocketAddr {
    let app = Router::new()
        .route("/ok", get(|| async { "ok" }))
        .route("/not-found", get(|| async { StatusCode::NOT_FOUND }))
        .route("/unavailable", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route(
            "/redirect",
            get(|| async { (StatusCode::MOVED_PERMANENTLY, [("location", "/unavailable")]) }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(SLOW_DELAY).await;
                "slow"
            }),
        )
        .route(
            "/stall",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Poll until `monitor_id` has at least `count` records, or panic after 5s.
pub async fn wait_for_records(
    store: &StateStore,
    monitor_id: MonitorId,
    count: usize,
) -> Vec<HealthRecord> {
    for _ in 0..250 {
        let records = store.list_recent_records(monitor_id, 100).unwrap();
        if records.len() >= count {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("monitor {monitor_id} never reached {count} records");
}
