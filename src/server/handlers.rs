//! API route handlers.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::archive::{self, BrowsePage, BrowseQuery};
use crate::config::ConfigError;
use crate::generate_tips;
use crate::models::TipRecord;
use crate::server::error::ApiError;
use crate::server::{AppState, ENDPOINTS};
use crate::utils::time_window::{TimeWindow, WindowFilter};
use crate::utils::tip_selector::{BetType, SelectionPolicy};
use crate::utils::validation::TipRequest;

pub const SERVICE_NAME: &str = "okosfoci-api";

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub service: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        status: "healthy",
        timestamp: Utc::now(),
        service: SERVICE_NAME,
    })
}

/// `/tippek` parameters; `window` is accepted as an alias of `timeWindow`
#[derive(Debug, Default, Deserialize)]
pub struct TipsQuery {
    pub date: Option<String>,
    #[serde(rename = "timeWindow")]
    pub time_window: Option<String>,
    pub window: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TipsResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub request: TipRequest,
    pub count: usize,
    pub tips: Vec<TipRecord>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Tip generation endpoint.
pub async fn tippek(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TipsQuery>, QueryRejection>,
) -> Result<Json<TipsResponse>, ApiError> {
    let Query(query) = query?;

    let request = TipRequest::parse(
        present(&query.date),
        present(&query.time_window).or(present(&query.window)),
        present(&query.limit),
        &state.config.limits,
        state.config.default_limit,
        Utc::now().date_naive(),
    )?;

    state.config.require_api_key().map_err(ApiError::not_configured)?;
    let source = state
        .source
        .as_deref()
        .ok_or_else(|| ApiError::not_configured(ConfigError::MissingApiKey))?;

    info!(
        "Generating tips for date={}, window={}, limit={}",
        request.date,
        request.time_window.label(),
        request.limit
    );
    let tips = generate_tips(source, &state.config.tips, &request, Some(&state.teams)).await;

    Ok(Json(TipsResponse {
        ok: true,
        request,
        count: tips.len(),
        tips,
    }))
}

#[derive(Debug, Serialize)]
pub struct WindowEntry {
    pub label: &'static str,
    pub value: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct WindowsResponse {
    pub ok: bool,
    pub windows: Vec<WindowEntry>,
}

/// Available time windows endpoint.
pub async fn windows() -> Json<WindowsResponse> {
    let mut windows: Vec<WindowEntry> = TimeWindow::ALL
        .iter()
        .map(|w| WindowEntry {
            label: w.label(),
            value: w.label(),
            description: w.description(),
        })
        .collect();
    windows.push(WindowEntry {
        label: WindowFilter::All.label(),
        value: WindowFilter::All.label(),
        description: "Whole day",
    });

    Json(WindowsResponse { ok: true, windows })
}

#[derive(Debug, Serialize)]
pub struct LimitsResponse {
    pub ok: bool,
    pub limits: Vec<usize>,
    pub default: usize,
    pub min: usize,
    pub max: usize,
}

/// Allowed result counts endpoint.
pub async fn limits(State(state): State<Arc<AppState>>) -> Json<LimitsResponse> {
    let (min, max) = state.config.limits.bounds();
    Json(LimitsResponse {
        ok: true,
        limits: state.config.limits.values(),
        default: state.config.default_limit,
        min,
        max,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    pub api_key_present: bool,
    pub leagues_count: usize,
    pub time_windows_count: usize,
    pub data_root: String,
    pub data_root_exists: bool,
    pub selection_policy: SelectionPolicy,
    pub bet_types: Vec<BetType>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ok: bool,
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub config: ConfigSnapshot,
    pub endpoints: &'static [&'static str],
}

/// Server status and configuration endpoint.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let config = &state.config;
    Json(StatusResponse {
        ok: true,
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
        config: ConfigSnapshot {
            api_key_present: config.api_key.is_some(),
            leagues_count: config.tips.leagues.len(),
            time_windows_count: TimeWindow::ALL.len(),
            data_root: config.data_root.display().to_string(),
            data_root_exists: tokio::fs::try_exists(&config.data_root)
                .await
                .unwrap_or(false),
            selection_policy: config.tips.policy,
            bet_types: config.tips.bet_types.clone(),
        },
        endpoints: ENDPOINTS,
    })
}

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub ok: bool,
    pub files: Vec<String>,
    pub files_abs: Vec<String>,
}

/// Archive file listing endpoint.
pub async fn files(State(state): State<Arc<AppState>>) -> Result<Json<FilesResponse>, ApiError> {
    let root = &state.config.data_root;
    let relative = archive::list_files(root).await?;

    Ok(Json(FilesResponse {
        ok: true,
        files: relative
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect(),
        files_abs: relative
            .iter()
            .map(|p| root.join(p).to_string_lossy().into_owned())
            .collect(),
    }))
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub page: BrowsePage,
}

/// Archive browsing endpoint.
pub async fn browse(
    State(state): State<Arc<AppState>>,
    query: Result<Query<BrowseQuery>, QueryRejection>,
) -> Result<Json<BrowseResponse>, ApiError> {
    let Query(query) = query?;
    let page = archive::browse(&state.config.data_root, &query).await?;
    Ok(Json(BrowseResponse { ok: true, page }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundBody {
    pub ok: bool,
    pub error: &'static str,
    pub message: String,
    pub available_endpoints: &'static [&'static str],
}

/// JSON 404 for every unknown route.
pub async fn not_found(method: Method, uri: Uri) -> Response {
    warn!("No route for {} {}", method, uri);
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundBody {
            ok: false,
            error: "Not Found",
            message: format!("Cannot {} {}", method, uri),
            available_endpoints: ENDPOINTS,
        }),
    )
        .into_response()
}
