pub mod catalog;
pub mod db;
pub mod error;
pub mod model;
pub mod routes;
pub mod wizard;

use std::path::PathBuf;

use axum::{extract::Extension, routing::get, Json, Router};
use sqlx::SqlitePool;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
};

use routes::auth::auth_router;
use routes::bookings::booking_router;
use routes::devices::device_router;
use routes::inventory::inventory_router;
use routes::services::service_router;
use routes::settings::settings_router;
use routes::tickets::ticket_router;
use routes::uploads::upload_router;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub upload_dir: PathBuf,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

/// The full application router: API routes first, uploaded files under
/// /storage, and the SPA build as the fallback for everything else.
pub fn app(state: AppState, frontend_dist: &str) -> Router {
    let spa = ServeDir::new(frontend_dist)
        .not_found_service(ServeFile::new(format!("{frontend_dist}/index.html")));

    Router::new()
        .merge(auth_router())
        .merge(booking_router())
        .merge(device_router())
        .merge(service_router())
        .merge(inventory_router())
        .merge(ticket_router())
        .merge(settings_router())
        .merge(upload_router())
        .route("/api/health", get(health))
        .nest_service("/storage", ServeDir::new(state.upload_dir.clone()))
        .fallback_service(spa)
        .layer(Extension(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
