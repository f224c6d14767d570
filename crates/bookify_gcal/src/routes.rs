// --- File: crates/bookify_gcal/src/routes.rs ---

use crate::handlers::{
    callback_handler, connect_handler, disconnect_handler, status_handler, GcalState,
};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates a router containing all routes for the calendar integration
/// surface. Requires GcalState to be built by the backend service.
pub fn routes(state: Arc<GcalState>) -> Router {
    Router::new()
        .route("/auth/google", get(connect_handler))
        .route("/auth/google/callback", get(callback_handler))
        .route("/gcal/disconnect", post(disconnect_handler))
        .route("/calendar/status", get(status_handler))
        .with_state(state)
}
