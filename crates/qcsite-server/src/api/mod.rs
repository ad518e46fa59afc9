mod events;
mod heatmap;
mod locations;
mod recommendations;
mod stats;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use qcsite_collector::{BroadcastSink, CollectionScheduler, CollectorError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<CollectionScheduler>,
    pub events: BroadcastSink,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    scheduler: &'static str,
    tracked_locations: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> usize {
    usize::try_from(limit.unwrap_or(20).clamp(1, 100)).unwrap_or(20)
}

pub(super) fn map_collector_error(request_id: String, error: &CollectorError) -> ApiError {
    match error {
        CollectorError::UnknownLocation(name) => ApiError::new(
            request_id,
            "not_found",
            format!("location {name} not found"),
        ),
        CollectorError::Stopped => {
            ApiError::new(request_id, "unavailable", "collector is shutting down")
        }
        CollectorError::AlreadyRunning => {
            ApiError::new(request_id, "conflict", "collector is already running")
        }
        CollectorError::InvalidSettings(_) | CollectorError::Scheduler(_) => {
            tracing::error!(error = %error, "collector operation failed");
            ApiError::new(request_id, "internal_error", "collector operation failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/locations", get(locations::list_locations))
        .route("/api/v1/locations/{name}", get(locations::get_location))
        .route(
            "/api/v1/locations/{name}/refresh",
            post(locations::refresh_location),
        )
        .route(
            "/api/v1/locations/{name}/competitors",
            get(locations::get_competitors),
        )
        .route(
            "/api/v1/locations/{name}/heatmap",
            get(heatmap::get_heatmap),
        )
        .route(
            "/api/v1/recommendations",
            get(recommendations::list_recommendations),
        )
        .route("/api/v1/stats", get(stats::get_stats))
        .route("/api/v1/status", get(stats::get_status))
        .route("/api/v1/events", get(events::stream_events))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let status = state.scheduler.status().await;
    Json(ApiResponse::new(
        HealthData {
            status: "ok",
            scheduler: if status.running { "running" } else { "stopped" },
            tracked_locations: status.tracked_locations,
        },
        req_id.0,
    ))
}

#[cfg(test)]
mod tests;
