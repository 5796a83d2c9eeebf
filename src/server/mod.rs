//! JSON HTTP API.

pub mod error;
pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::FootballDataSource;
use crate::config::Config;
use crate::utils::teams::TeamDatabase;

pub use error::ApiError;

pub const ENDPOINTS: &[&str] = &[
    "GET /health",
    "GET /windows",
    "GET /limits",
    "GET /tippek?date=YYYY-MM-DD&timeWindow=all|0-8|8-16|16-24&limit=N",
    "GET /status",
    "GET /files",
    "GET /browse?file=path&page=1&limit=10&window=HH:MM-HH:MM&league=name",
];

/// Application state shared across handlers.
pub struct AppState {
    pub config: Config,
    /// `None` when no API key is configured
    pub source: Option<Arc<dyn FootballDataSource>>,
    pub teams: TeamDatabase,
}

impl AppState {
    pub fn new(
        config: Config,
        source: Option<Arc<dyn FootballDataSource>>,
        teams: TeamDatabase,
    ) -> Self {
        Self {
            config,
            source,
            teams,
        }
    }
}

/// Build the API router with CORS open to every origin and request tracing
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/tippek", get(handlers::tippek))
        .route("/windows", get(handlers::windows))
        .route("/limits", get(handlers::limits))
        .route("/status", get(handlers::status))
        .route("/files", get(handlers::files))
        .route("/browse", get(handlers::browse))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
