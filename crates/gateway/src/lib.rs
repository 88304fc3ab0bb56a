//! HTTP API gateway for WellNest.
//!
//! Exposes the activity retrieval service over REST: the v1 API, the
//! legacy `/fetch-activities` path, and a health check.
//!
//! Built on Axum for high performance async HTTP.

pub mod api_v1;
pub mod stores;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::Json,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Instrument, info, info_span, warn};

use wellnest_config::AppConfig;

pub use stores::SetupError;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the full router: health, legacy path, and the nested v1 API.
///
/// Layers applied:
/// - request id (honored from the client or minted)
/// - CORS restricted to `allowed_origins`
/// - HTTP trace logging
pub fn build_router(state: api_v1::SharedApiState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/fetch-activities", get(api_v1::list_activities_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

/// CORS for read-only GET access. `"*"` allows any origin; entries that
/// are not valid header values are skipped.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Attach a request id to the request's span and echo it on the response.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: Next,
) -> axum::response::Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path()
    );
    let mut response = next.run(req).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// Start the gateway HTTP server.
///
/// Stores are opened once here and shared by every request.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let service = stores::build_service(&config).await?;
    let state = Arc::new(api_v1::ApiState::new(service));
    let app = build_router(state, &config.gateway.allowed_origins);

    info!(addr = %addr, "Gateway starting with v1 API");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
