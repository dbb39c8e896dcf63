//! urlwatch-api: REST API for urlwatch.
//!
//! Provides axum route handlers for registering monitors, soft-deleting
//! them, and reading their check history.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/` | Service banner |
//! | GET | `/healthz` | Liveness of the service itself |
//! | GET | `/api/v1/monitors` | List monitors (`skip`, `limit`) |
//! | POST | `/api/v1/monitors` | Register a monitor |
//! | GET | `/api/v1/monitors/{id}` | Get one monitor |
//! | DELETE | `/api/v1/monitors/{id}` | Deactivate a monitor |
//! | GET | `/api/v1/monitors/{id}/checks` | Recent health records (`limit`) |

pub mod handlers;

use axum::Router;
use axum::routing::get;
use urlwatch_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
}

/// Build the complete API router.
pub fn build_router(store: StateStore) -> Router {
    let api_state = ApiState { store };

    let api_routes = Router::new()
        .route(
            "/monitors",
            get(handlers::list_monitors).post(handlers::create_monitor),
        )
        .route(
            "/monitors/{id}",
            get(handlers::get_monitor).delete(handlers::delete_monitor),
        )
        .route("/monitors/{id}/checks", get(handlers::list_checks))
        .with_state(api_state);

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api_routes)
}
