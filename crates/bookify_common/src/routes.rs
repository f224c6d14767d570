// --- File: crates/bookify_common/src/routes.rs ---

use axum::{routing::get, Json, Router};
use serde_json::json;

/// Creates a router containing common routes shared across the application.
pub fn routes() -> Router {
    Router::new().route(
        "/health",
        get(|| async { Json(json!({ "status": "ok" })) }),
    )
}
