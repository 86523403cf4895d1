//! Error types for the copdem library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when working with DEM data.
///
/// Coverage gaps (missing tiles, nodata pixels, out-of-raster coordinates)
/// are *not* errors; they surface as `None` elevations. This enum covers
/// malformed request bodies and genuinely broken tile files.
#[derive(Error, Debug)]
pub enum DemError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The raster decoded, but its contents are inconsistent.
    #[error("corrupt raster {path}: {detail}")]
    CorruptRaster { path: PathBuf, detail: String },

    /// The request body matches none of the recognized shapes, or a
    /// recognized shape is internally inconsistent.
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl DemError {
    /// Build an [`DemError::InvalidInput`] from any message.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        DemError::InvalidInput {
            message: message.into(),
        }
    }

    /// Whether this error is the caller's fault (4xx-class).
    pub fn is_client_error(&self) -> bool {
        matches!(self, DemError::InvalidInput { .. })
    }
}

/// Result type alias using [`DemError`].
pub type Result<T> = std::result::Result<T, DemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DemError::invalid_input("no recognized shape");
        assert!(err.to_string().contains("no recognized shape"));

        let err = DemError::CorruptRaster {
            path: PathBuf::from("Copernicus_DSM_COG_10_N47_00_E009_00_DEM.tif"),
            detail: "sample count mismatch".to_string(),
        };
        assert!(err.to_string().contains("N47_00_E009_00"));
        assert!(err.to_string().contains("sample count mismatch"));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(DemError::invalid_input("bad body").is_client_error());
        let io = DemError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert!(!io.is_client_error());
    }
}
