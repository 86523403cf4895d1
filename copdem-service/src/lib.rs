//! copdem Service Library
//!
//! HTTP handlers and types for the Copernicus DEM elevation service.
//! This library is used by both the copdem-service binary and integration tests.

pub mod handlers;

use copdem::Sampler;

/// Application state shared across handlers.
pub struct AppState {
    /// Elevation sampler over the shared tile store.
    pub sampler: Sampler,
}

// Re-export commonly used types for convenience
pub use handlers::{AliveResponse, ErrorResponse, HealthResponse, StatsResponse};
