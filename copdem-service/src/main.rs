//! copdem Service - HTTP microservice for Copernicus DEM elevation queries.
//!
//! Accepts GeoJSON feature collections, coordinate lists, and track-point
//! sequences and returns them with ground elevation injected.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `COPDEM_TILES_DIR` | Directory containing Copernicus DEM GeoTIFF tiles | Required |
//! | `COPDEM_PORT` | HTTP server port | 8084 |
//! | `COPDEM_PRELOAD` | `all`, or `min_lat,min_lon,max_lat,max_lon[;…]` | None |
//! | `RUST_LOG` | Log level (e.g., "info", "debug") | "info" |
//!
//! ## Endpoints
//!
//! - `POST /` - Augment a body (FeatureCollection, coordinate list, or track points)
//! - `GET /` - Aliveness
//! - `GET /health` - Health check
//! - `GET /stats` - Cache statistics
//! - `GET /docs` - OpenAPI documentation (Swagger UI)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use copdem::{BoundingBox, Sampler, TileStore};
use copdem_service::{handlers, AppState};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation for the copdem service.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "copdem Elevation Service",
        version = "0.1.0",
        description = "REST API for augmenting coordinates and trajectories with ground elevation from Copernicus DEM tiles.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        handlers::alive,
        handlers::augment,
        handlers::health_check,
        handlers::get_stats,
    ),
    components(
        schemas(
            handlers::AliveResponse,
            handlers::ErrorResponse,
            handlers::HealthResponse,
            handlers::StatsResponse,
        )
    ),
    tags(
        (name = "elevation", description = "Elevation augmentation endpoints"),
        (name = "system", description = "System and health endpoints")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "copdem_service=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load port from environment (service-specific config)
    let port: u16 = std::env::var("COPDEM_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8084);

    // Build the tile store from COPDEM_TILES_DIR
    let store = match TileStore::from_env() {
        Ok(store) => store,
        Err(_) => {
            tracing::warn!("COPDEM_TILES_DIR not set, using current directory");
            TileStore::new(".")
        }
    };

    tracing::info!(
        tiles_dir = %store.tiles_dir().display(),
        port = port,
        "Starting copdem service"
    );

    // Handle COPDEM_PRELOAD environment variable
    if let Ok(preload_val) = std::env::var("COPDEM_PRELOAD") {
        let bounds = parse_preload_bounds(&preload_val);
        let bounds_ref = bounds.as_deref();
        tracing::info!(
            bounds = ?bounds_ref.map(|b| b.len()),
            "Preloading tiles into cache"
        );
        let stats = store.preload(bounds_ref);
        tracing::info!(
            tiles_loaded = stats.tiles_loaded,
            tiles_already_cached = stats.tiles_already_cached,
            tiles_failed = stats.tiles_failed,
            tiles_matched = stats.tiles_matched,
            elapsed_ms = stats.elapsed_ms,
            "Preload complete"
        );
    }

    let store = Arc::new(store);
    let state = Arc::new(AppState {
        sampler: Sampler::new(Arc::clone(&store)),
    });

    // Build router
    let app = Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::alive).post(handlers::augment))
        .route("/health", get(handlers::health_check))
        .route("/stats", get(handlers::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // No request can still be in flight once serve returns; release handles
    store.close_all();

    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Parse the `COPDEM_PRELOAD` environment variable value into bounding boxes.
///
/// Supported formats:
/// - `true`, `all`, `1` — preload all tiles (returns `None`)
/// - `min_lat,min_lon,max_lat,max_lon` — single bounding box
/// - `min_lat,min_lon,max_lat,max_lon;…` — multiple bounding boxes
fn parse_preload_bounds(value: &str) -> Option<Vec<BoundingBox>> {
    let trimmed = value.trim();

    // Check for "all tiles" keywords
    match trimmed.to_lowercase().as_str() {
        "true" | "all" | "1" => return None,
        _ => {}
    }

    // Parse as bounding boxes separated by ';'
    let boxes: Vec<BoundingBox> = trimmed
        .split(';')
        .filter_map(|bbox_str| {
            let parts: Vec<f64> = bbox_str
                .split(',')
                .filter_map(|s| s.trim().parse::<f64>().ok())
                .collect();
            if parts.len() == 4 {
                Some(BoundingBox::new(parts[0], parts[1], parts[2], parts[3]))
            } else {
                tracing::warn!(
                    bbox = bbox_str,
                    "Invalid bounding box format, expected min_lat,min_lon,max_lat,max_lon"
                );
                None
            }
        })
        .collect();

    if boxes.is_empty() {
        // If parsing failed entirely, fall back to loading all tiles
        tracing::warn!(
            value = trimmed,
            "Could not parse COPDEM_PRELOAD value, preloading all tiles"
        );
        None
    } else {
        Some(boxes)
    }
}
