// File: services/bookify_backend/src/main.rs
mod app_state;
mod service_factory;

use app_state::AppState;
use axum::{routing::get, Router};
use bookify_booking::handlers::BookingState;
use bookify_booking::routes as booking_routes;
use bookify_common::services::ServiceFactory;
use bookify_config::load_config;
use bookify_gcal::handlers::GcalState;
use bookify_gcal::routes as gcal_routes;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;

#[tokio::main]
async fn main() {
    let config = Arc::new(load_config().expect("Failed to load config"));
    bookify_common::logging::init();

    let state = AppState::new(config.clone())
        .await
        .expect("Failed to connect to the database");
    state
        .repos
        .init_schemas()
        .await
        .expect("Failed to initialize database schemas");

    let booking_state = Arc::new(BookingState::new(
        config.clone(),
        state.repos.clone(),
        state.service_factory.calendar_provider(),
    ));

    let mut api_router = Router::new()
        .route("/", get(|| async { "Welcome to the Bookify API!" }))
        .merge(bookify_common::routes())
        .merge(booking_routes::routes(booking_state));

    // The integration surface only mounts when a Google OAuth client is
    // configured; hosts simply stay on local-only availability otherwise.
    match state.service_factory.google_client() {
        Some(client) => {
            let gcal_state = Arc::new(GcalState {
                config: config.clone(),
                repos: state.repos.clone(),
                client,
            });
            api_router = api_router.merge(gcal_routes::routes(gcal_state));
        }
        None => info!("Google Calendar integration disabled"),
    }

    let mut app = Router::new().nest("/api", api_router);

    // Serve static files in dev mode
    if cfg!(debug_assertions) {
        app = app.fallback_service(ServeDir::new("dist"));
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await.unwrap();
    println!("Starting server at http://{}", addr);
    println!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}
