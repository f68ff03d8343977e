//! HTTP API
//!
//! - `GET /api/latest-signals?limit=N`: newest posts with sentiment and signal
//! - `GET /health`: liveness


use crate::config::{Config, ServerConfig};
use crate::error::SignalError;
use crate::pipeline::SignalPipeline;
use crate::strategy::Signal;
use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: SignalPipeline,
    pub default_limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct SignalsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

/// Error as seen by HTTP callers
pub struct ApiError(SignalError);

impl From<SignalError> for ApiError {
    fn from(err: SignalError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self.0 {
            SignalError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            e if e.is_upstream() => (StatusCode::BAD_GATEWAY, "upstream_failure"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        if status.is_server_error() {
            error!("Request failed ({}): {}", status.as_u16(), self.0);
        } else {
            warn!("Rejected request: {}", self.0);
        }

        let body = ErrorBody {
            error: kind.to_string(),
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn latest_signals(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignalsQuery>,
) -> Result<Json<Vec<Signal>>, ApiError> {
    let limit = query.limit.unwrap_or(state.default_limit);
    let signals = state.pipeline.latest_signals(Some(limit)).await?;
    Ok(Json(signals))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// CORS policy: GET only. An explicit allow-list also allows credentials;
/// a wildcard does not, since browsers reject credentialed wildcard responses.
pub fn cors_layer(config: &ServerConfig) -> crate::error::Result<CorsLayer> {
    let origins = config.origins();
    let base = CorsLayer::new().allow_methods([Method::GET]);

    if origins.is_empty() {
        return Ok(base.allow_origin(Any).allow_headers(Any));
    }

    let values = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| SignalError::Config(format!("invalid CORS origin {:?}", origin)))
        })
        .collect::<crate::error::Result<Vec<_>>>()?;

    Ok(base
        .allow_origin(AllowOrigin::list(values))
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/latest-signals", get(latest_signals))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Build everything from config and serve until the process is stopped
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let state = AppState {
        pipeline: SignalPipeline::from_config(config)?,
        default_limit: config.server.default_limit,
    };
    let app = router(state, cors_layer(&config.server)?);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Signal API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
