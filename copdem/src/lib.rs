//! # copdem - Copernicus DEM Elevation Library
//!
//! Library for augmenting geographic coordinates and trajectories with
//! ground elevation from locally stored Copernicus DSM GeoTIFF tiles.
//!
//! ## Features
//!
//! - **Deterministic tile addressing**: coordinate → 1°×1° cell → file name,
//!   hemisphere-aware with floor semantics
//! - **Shared tile cache**: tiles open lazily, exactly once, and stay open
//!   behind `Arc` until shutdown
//! - **Fault-isolated sampling**: missing tiles, nodata pixels and
//!   out-of-bounds coordinates degrade to an explicit absence, never an error
//! - **Shape-aware augmentation**: GeoJSON feature collections, coordinate
//!   lists and track-point sequences go in and come back out in the same
//!   structure with elevation injected
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use copdem::{Sampler, TileStore};
//!
//! let store = Arc::new(TileStore::new("/data/copernicus"));
//! let sampler = Sampler::new(store);
//!
//! // Single point
//! if let Some(elevation) = sampler.sample(45.9237, 6.8694) {
//!     println!("Elevation: {elevation}m");
//! }
//!
//! // Whole request body, shape preserved
//! let body = serde_json::json!({"coordinates": [{"lat": 45.9237, "lon": 6.8694}]});
//! let augmented = copdem::augment(&sampler, body)?;
//! ```
//!
//! ## Tile Data Format
//!
//! Tiles are Copernicus DSM GeoTIFF files, one per 1°×1° cell, named by the
//! cell's lower-left corner:
//!
//! `Copernicus_DSM_COG_10_N47_00_E009_00_DEM.tif`
//!
//! Georeferencing comes from the GeoTIFF ModelTiepoint/ModelPixelScale tags
//! (with a fallback derived from the file name), the nodata sentinel from
//! the GDAL_NODATA tag. Tiles are provisioned onto disk by an external tool;
//! this library only reads them.
//!
//! ## Data Sources
//!
//! Copernicus DEM tiles are published by ESA/Airbus:
//! - <https://dataspace.copernicus.eu/>
//! - <https://registry.opendata.aws/copernicus-dem/>

pub mod cell;
pub mod error;
pub mod sampler;
pub mod shapes;
pub mod store;
pub mod tile;

// Re-export main types at crate root for convenience
pub use cell::TileId;
pub use error::{DemError, Result};
pub use sampler::Sampler;
pub use shapes::{augment, CoordinatePoint, GROUND_ELEVATION, TERRAIN_ELEVATION};
pub use store::{BoundingBox, CacheStats, PreloadStats, TileStore};
pub use tile::{GeoTransform, RasterTile};
