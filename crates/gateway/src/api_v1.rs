//! HTTP API v1 — activity retrieval.
//!
//! Endpoints:
//!
//! - `GET /v1/activities`        — Filtered activities with flashcards
//!   (`age`, `diagnosis`, `themes` query parameters, all optional)
//! - `GET /v1/activities/{id}`   — One activity with flashcards
//! - `GET /v1/status`            — Backend names, catalog reachability, uptime

use axum::{
    Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use wellnest_core::error::Error;
use wellnest_core::{ActivityResponse, EnrichedActivity, FilterCriteria};
use wellnest_retrieval::RetrievalService;

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the v1 API.
pub struct ApiState {
    pub service: RetrievalService,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

impl ApiState {
    pub fn new(service: RetrievalService) -> Self {
        Self {
            service,
            start_time: chrono::Utc::now(),
        }
    }
}

pub type SharedApiState = Arc<ApiState>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/activities", get(list_activities_handler))
        .route("/activities/{id}", get(get_activity_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A request error rendered as `{"error": ...}` with a matching status.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::InvalidFilter(_) => (StatusCode::BAD_REQUEST, self.0.to_string()),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            Error::Catalog(e) => {
                error!(error = %e, "Activity catalog failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Activity catalog is unavailable".to_string(),
                )
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

// ── Activities ────────────────────────────────────────────────────────────

/// Raw query parameters. Parsed by [`FilterCriteria::parse`] so that a bad
/// age gets a JSON 400 instead of a plain-text rejection. Query strings
/// that fail to deserialize (e.g. a repeated key) get the same JSON 400.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityParams {
    pub age: Option<String>,
    pub diagnosis: Option<String>,
    pub themes: Option<String>,
}

/// `GET /v1/activities`, also mounted at `GET /fetch-activities`.
pub async fn list_activities_handler(
    State(state): State<SharedApiState>,
    query: Result<Query<ActivityParams>, QueryRejection>,
) -> Result<Json<ActivityResponse>, ApiError> {
    let Query(params) = query.map_err(|e| Error::InvalidFilter(e.body_text()))?;
    let criteria = FilterCriteria::parse(
        params.age.as_deref(),
        params.diagnosis.as_deref(),
        params.themes.as_deref(),
    )?;
    info!(
        age = ?criteria.age,
        diagnosis = ?criteria.diagnosis,
        themes = ?criteria.themes,
        "Fetching activities"
    );

    let response = state.service.fetch_activities(criteria).await?;
    Ok(Json(response))
}

async fn get_activity_handler(
    State(state): State<SharedApiState>,
    Path(id): Path<String>,
) -> Result<Json<EnrichedActivity>, ApiError> {
    let activity = state.service.get_activity(&id).await?;
    Ok(Json(activity))
}

// ── Status ────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct StatusResponse {
    status: String,
    version: String,
    uptime_secs: u64,
    catalog: String,
    catalog_reachable: bool,
    content: String,
}

async fn status_handler(State(state): State<SharedApiState>) -> Json<StatusResponse> {
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.start_time)
        .num_seconds()
        .max(0) as u64;
    let catalog_reachable = state.service.catalog().ping().await.is_ok();

    Json(StatusResponse {
        status: if catalog_reachable { "healthy" } else { "degraded" }.into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_secs: uptime,
        catalog: state.service.catalog_name().into(),
        catalog_reachable,
        content: state.service.content_name().into(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────
