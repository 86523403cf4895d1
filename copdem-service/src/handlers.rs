//! HTTP request handlers for the elevation service.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::AppState;

/// Aliveness response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AliveResponse {
    /// Service name.
    pub message: String,
}

/// Error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

/// Cache statistics response.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    /// Number of tiles held open in the cache.
    pub cached_tiles: u64,
    /// Cache hit count.
    pub cache_hits: u64,
    /// Cache miss count.
    pub cache_misses: u64,
    /// Cache hit rate (0.0 to 1.0).
    pub hit_rate: f64,
}

/// Service aliveness.
#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "Service is alive", body = AliveResponse)
    )
)]
pub async fn alive() -> Json<AliveResponse> {
    Json(AliveResponse {
        message: "copdem".to_string(),
    })
}

/// Augment a request body with ground elevation.
///
/// The body must be one of the three recognized shapes: a GeoJSON
/// FeatureCollection, a coordinate list, or a track-point sequence. The
/// response is the same shape with elevation fields injected; coordinates
/// without tile coverage get `null`.
#[utoipa::path(
    post,
    path = "/",
    tag = "elevation",
    responses(
        (status = 200, description = "The body in its original shape with elevation injected"),
        (status = 400, description = "Body matches no recognized shape", body = ErrorResponse),
        (status = 500, description = "Unexpected internal failure", body = ErrorResponse)
    )
)]
#[axum::debug_handler]
pub async fn augment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> axum::response::Response {
    match copdem::augment(&state.sampler, body) {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) if e.is_client_error() => {
            tracing::debug!(error = %e, "rejected request body");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "augmentation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("internal error: {e}"),
                }),
            )
                .into_response()
        }
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Tile cache statistics.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "system",
    responses(
        (status = 200, description = "Tile cache statistics", body = StatsResponse)
    )
)]
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let stats = state.sampler.store().cache_stats();

    Json(StatsResponse {
        cached_tiles: stats.entry_count,
        cache_hits: stats.hit_count,
        cache_misses: stats.miss_count,
        hit_rate: stats.hit_rate(),
    })
}
