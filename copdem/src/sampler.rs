//! Per-point and batch elevation resolution.
//!
//! [`Sampler`] turns a coordinate into an elevation in meters or an explicit
//! `None`. Every failure mode below the sampler (missing tile, unreadable
//! raster, out-of-bounds pixel, nodata) degrades to `None`; sampling never
//! raises to its caller.

use std::sync::Arc;

use crate::cell::TileId;
use crate::store::TileStore;

/// Resolves coordinates to ground elevation against a shared [`TileStore`].
#[derive(Clone)]
pub struct Sampler {
    store: Arc<TileStore>,
}

impl Sampler {
    /// Create a sampler over a store.
    pub fn new(store: Arc<TileStore>) -> Self {
        Self { store }
    }

    /// The underlying tile store.
    pub fn store(&self) -> &TileStore {
        &self.store
    }

    /// Ground elevation in meters at a coordinate, or `None` when no
    /// measurement is available there.
    ///
    /// `None` covers: no tile file for the cell, a tile that fails to open,
    /// a pixel outside the raster, a nodata pixel, and non-finite input
    /// coordinates. It is never conflated with an elevation of zero.
    pub fn sample(&self, lat: f64, lon: f64) -> Option<f64> {
        if !lat.is_finite() || !lon.is_finite() {
            tracing::debug!(lat, lon, "non-finite coordinate");
            return None;
        }

        let id = TileId::for_coord(lat, lon);
        let tile = self.store.get_or_open(id)?;
        tile.sample(lat, lon)
    }

    /// Resolve an ordered batch of `(lat, lon)` coordinates.
    ///
    /// The result has the same length and order as the input; an empty batch
    /// yields an empty result. Each coordinate resolves independently, so one
    /// unresolvable point only degrades its own slot. Repeated coordinates
    /// are sampled again rather than deduplicated; the tile cache absorbs
    /// the cost.
    pub fn sample_batch(&self, coords: &[(f64, f64)]) -> Vec<Option<f64>> {
        coords.iter().map(|&(lat, lon)| self.sample(lat, lon)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::Path;
    use tempfile::TempDir;
    use tiff::encoder::{colortype, TiffEncoder};

    /// Write a uniform-elevation test tile named by convention.
    fn create_test_tile(dir: &Path, id: TileId, elevation: f32) {
        let size = 10u32;
        let data = vec![elevation; (size * size) as usize];
        let file = File::create(dir.join(id.file_name())).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        encoder
            .write_image::<colortype::Gray32Float>(size, size, &data)
            .unwrap();
    }

    fn sampler_for(dir: &TempDir) -> Sampler {
        Sampler::new(Arc::new(TileStore::new(dir.path())))
    }

    #[test]
    fn test_sample_basic() {
        let dir = TempDir::new().unwrap();
        create_test_tile(dir.path(), TileId::new(45, 6), 1042.0);

        let sampler = sampler_for(&dir);
        assert_eq!(sampler.sample(45.9237, 6.8694), Some(1042.0));
    }

    #[test]
    fn test_sample_missing_tile() {
        let dir = TempDir::new().unwrap();
        let sampler = sampler_for(&dir);
        assert_eq!(sampler.sample(50.0, 50.0), None);
    }

    #[test]
    fn test_sample_non_finite() {
        let dir = TempDir::new().unwrap();
        let sampler = sampler_for(&dir);
        assert_eq!(sampler.sample(f64::NAN, 6.5), None);
        assert_eq!(sampler.sample(45.5, f64::INFINITY), None);
    }

    #[test]
    fn test_sample_repeated_is_stable() {
        let dir = TempDir::new().unwrap();
        create_test_tile(dir.path(), TileId::new(45, 6), 500.0);

        let sampler = sampler_for(&dir);
        let first = sampler.sample(45.5, 6.5);
        let second = sampler.sample(45.5, 6.5);
        assert_eq!(first, Some(500.0));
        assert_eq!(first, second);
    }

    #[test]
    fn test_batch_length_and_order() {
        let dir = TempDir::new().unwrap();
        create_test_tile(dir.path(), TileId::new(45, 6), 100.0);
        create_test_tile(dir.path(), TileId::new(46, 7), 200.0);

        let coords = vec![(45.5, 6.5), (46.5, 7.5), (45.6, 6.6)];
        let results = sampler_for(&dir).sample_batch(&coords);

        assert_eq!(results.len(), coords.len());
        assert_eq!(results, vec![Some(100.0), Some(200.0), Some(100.0)]);
    }

    #[test]
    fn test_batch_empty() {
        let dir = TempDir::new().unwrap();
        let results = sampler_for(&dir).sample_batch(&[]);
        assert!(results.is_empty());
    }

    #[test]
    fn test_batch_fault_isolation() {
        let dir = TempDir::new().unwrap();
        create_test_tile(dir.path(), TileId::new(45, 6), 100.0);

        // Middle coordinate has no covering tile; its neighbors still resolve
        let coords = vec![(45.5, 6.5), (10.0, 10.0), (45.6, 6.6)];
        let results = sampler_for(&dir).sample_batch(&coords);

        assert_eq!(results, vec![Some(100.0), None, Some(100.0)]);
    }

    #[test]
    fn test_sample_after_close() {
        let dir = TempDir::new().unwrap();
        create_test_tile(dir.path(), TileId::new(45, 6), 100.0);

        let sampler = sampler_for(&dir);
        assert_eq!(sampler.sample(45.5, 6.5), Some(100.0));

        sampler.store().close_all();
        assert_eq!(sampler.sample(45.5, 6.5), None);
    }
}
