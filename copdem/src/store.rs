//! Process-wide cache of open raster tile handles.
//!
//! This module provides [`TileStore`], the only shared mutable state in the
//! elevation pipeline. Tiles are opened lazily on first access, kept behind
//! `Arc` for concurrent readers, and released together at shutdown.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use moka::sync::Cache;

use crate::cell::TileId;
use crate::error::{DemError, Result};
use crate::tile::RasterTile;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of tiles currently held open.
    pub entry_count: u64,
    /// Number of lookups served from the cache.
    pub hit_count: u64,
    /// Number of lookups that went to disk.
    pub miss_count: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

/// A geographic bounding box for filtering tiles during preload.
///
/// Coordinates are in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    /// Minimum latitude (southern boundary).
    pub min_lat: f64,
    /// Minimum longitude (western boundary).
    pub min_lon: f64,
    /// Maximum latitude (northern boundary).
    pub max_lat: f64,
    /// Maximum longitude (eastern boundary).
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Check if this bounding box overlaps the 1°×1° cell of `id`.
    ///
    /// A tile covers `[lat, lat+1) × [lon, lon+1)`.
    pub fn overlaps_tile(&self, id: TileId) -> bool {
        let tile_max_lat = id.lat() + 1;
        let tile_max_lon = id.lon() + 1;

        self.min_lat < tile_max_lat as f64
            && self.max_lat > id.lat() as f64
            && self.min_lon < tile_max_lon as f64
            && self.max_lon > id.lon() as f64
    }
}

/// Statistics from a preload operation.
#[derive(Debug, Clone, Default)]
pub struct PreloadStats {
    /// Number of tiles successfully opened into the cache.
    pub tiles_loaded: u64,
    /// Number of tiles that were already cached.
    pub tiles_already_cached: u64,
    /// Number of tiles that failed to open.
    pub tiles_failed: u64,
    /// Number of tiles that matched the bounding box filter.
    pub tiles_matched: u64,
    /// Total elapsed time in milliseconds.
    pub elapsed_ms: u64,
}

/// Concurrency-safe store of open Copernicus DEM tiles.
///
/// The store maps [`TileId`]s to open [`RasterTile`] handles. A tile is
/// opened at most once: concurrent first-accesses to the same cell are
/// serialized by the cache's atomic insert-if-absent, so two requests cannot
/// double-open the backing file. Failed opens are *not* cached: the next
/// request for that cell probes the filesystem again.
///
/// # Example
///
/// ```ignore
/// use copdem::{TileId, TileStore};
///
/// let store = TileStore::new("/data/copernicus");
/// if let Some(tile) = store.get_or_open(TileId::for_coord(45.92, 6.87)) {
///     println!("{:?}m", tile.sample(45.92, 6.87));
/// }
/// store.close_all();
/// ```
pub struct TileStore {
    /// Directory containing Copernicus DEM tile files.
    tiles_dir: PathBuf,
    /// Open tiles, keyed by cell.
    tiles: Cache<TileId, Arc<RasterTile>>,
    /// Number of cache hits.
    hit_count: AtomicU64,
    /// Number of cache misses.
    miss_count: AtomicU64,
    /// Set once at shutdown; all lookups become unavailable.
    closed: AtomicBool,
}

impl TileStore {
    /// Create a store over a tile directory.
    ///
    /// A missing directory is not an error: it logs one warning and every
    /// lookup resolves as unavailable until tiles appear.
    pub fn new<P: AsRef<Path>>(tiles_dir: P) -> Self {
        let tiles_dir = tiles_dir.as_ref().to_path_buf();

        if !tiles_dir.is_dir() {
            tracing::warn!(
                tiles_dir = %tiles_dir.display(),
                "tiles directory does not exist; elevation lookups will be unavailable"
            );
        }

        Self {
            tiles_dir,
            tiles: Cache::builder().build(),
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Create a store from the `COPDEM_TILES_DIR` environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is not set.
    pub fn from_env() -> Result<Self> {
        let tiles_dir = std::env::var("COPDEM_TILES_DIR").map_err(|_| {
            DemError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "COPDEM_TILES_DIR environment variable not set",
            ))
        })?;

        Ok(Self::new(tiles_dir))
    }

    /// Get the open handle for a cell, opening the backing file on first
    /// access. Returns `None` when no tile covers the cell, when opening
    /// fails, or after [`Self::close_all`].
    pub fn get_or_open(&self, id: TileId) -> Option<Arc<RasterTile>> {
        if self.closed.load(Ordering::Acquire) {
            tracing::warn!(tile = %id, "tile store is closed; lookup treated as unavailable");
            return None;
        }

        if let Some(tile) = self.tiles.get(&id) {
            self.hit_count.fetch_add(1, Ordering::Relaxed);
            return Some(tile);
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);

        // Atomic insert-if-absent: if several requests race on the same
        // uncached cell, exactly one runs the open; the rest receive its
        // handle. A `None` result is not cached, so a missing tile is
        // re-probed on the next request.
        self.tiles.optionally_get_with(id, || self.open_tile(id))
    }

    /// Open the backing file for a cell, or `None` when it is absent/broken.
    fn open_tile(&self, id: TileId) -> Option<Arc<RasterTile>> {
        let path = self.tiles_dir.join(id.file_name());

        if !path.exists() {
            tracing::debug!(tile = %id, path = %path.display(), "no tile file for cell");
            return None;
        }

        match RasterTile::open(&path, id) {
            Ok(tile) => {
                let (width, height) = tile.dimensions();
                tracing::debug!(tile = %id, width, height, "opened tile");
                Some(Arc::new(tile))
            }
            Err(e) => {
                tracing::warn!(tile = %id, path = %path.display(), error = %e, "failed to open tile");
                None
            }
        }
    }

    /// Release every open handle and refuse further lookups.
    ///
    /// Must only run once no in-flight request can still be sampling; after
    /// this, [`Self::get_or_open`] logs and returns `None`.
    pub fn close_all(&self) {
        self.closed.store(true, Ordering::Release);
        self.tiles.invalidate_all();
        tracing::info!("tile store closed");
    }

    /// Whether [`Self::close_all`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.tiles.entry_count(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    /// The tile directory this store reads from.
    pub fn tiles_dir(&self) -> &Path {
        &self.tiles_dir
    }

    /// Scan the tile directory for files following the Copernicus naming
    /// convention. Returns sorted file names.
    pub fn scan_tile_files(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.tiles_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let names: BTreeSet<String> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                TileId::from_file_name(&name).map(|_| name)
            })
            .collect();

        names.into_iter().collect()
    }

    /// Open tiles into the cache ahead of traffic.
    ///
    /// Scans the tile directory and opens every tile, optionally filtered by
    /// one or more bounding boxes. Useful for warming the cache at startup
    /// when tiles live on high-latency storage.
    pub fn preload(&self, bounds: Option<&[BoundingBox]>) -> PreloadStats {
        let start = Instant::now();
        let mut stats = PreloadStats::default();

        for name in self.scan_tile_files() {
            let Some(id) = TileId::from_file_name(&name) else {
                continue;
            };

            if let Some(boxes) = bounds {
                if !boxes.iter().any(|b| b.overlaps_tile(id)) {
                    continue;
                }
            }

            stats.tiles_matched += 1;

            if self.tiles.contains_key(&id) {
                stats.tiles_already_cached += 1;
                continue;
            }

            match self.get_or_open(id) {
                Some(_) => stats.tiles_loaded += 1,
                None => stats.tiles_failed += 1,
            }
        }

        stats.elapsed_ms = start.elapsed().as_millis() as u64;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
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

    #[test]
    fn test_get_or_open_basic() {
        let dir = TempDir::new().unwrap();
        let id = TileId::new(45, 6);
        create_test_tile(dir.path(), id, 1042.0);

        let store = TileStore::new(dir.path());
        let tile = store.get_or_open(id).unwrap();
        assert_eq!(tile.sample(45.5, 6.5), Some(1042.0));
    }

    #[test]
    fn test_get_or_open_idempotent() {
        let dir = TempDir::new().unwrap();
        let id = TileId::new(45, 6);
        create_test_tile(dir.path(), id, 500.0);

        let store = TileStore::new(dir.path());
        let first = store.get_or_open(id).unwrap();
        let second = store.get_or_open(id).unwrap();

        // Same handle, not a reopened file
        assert!(Arc::ptr_eq(&first, &second));

        let stats = store.cache_stats();
        assert_eq!(stats.miss_count, 1);
        assert_eq!(stats.hit_count, 1);
    }

    #[test]
    fn test_missing_tile_not_cached() {
        let dir = TempDir::new().unwrap();
        let id = TileId::new(45, 6);

        let store = TileStore::new(dir.path());
        assert!(store.get_or_open(id).is_none());

        // The negative result was not cached: once the file appears, the
        // next lookup succeeds.
        create_test_tile(dir.path(), id, 321.0);
        let tile = store.get_or_open(id).unwrap();
        assert_eq!(tile.sample(45.5, 6.5), Some(321.0));
    }

    #[test]
    fn test_corrupt_tile_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let id = TileId::new(45, 6);
        std::fs::write(dir.path().join(id.file_name()), b"junk").unwrap();

        let store = TileStore::new(dir.path());
        assert!(store.get_or_open(id).is_none());
    }

    #[test]
    fn test_missing_directory_is_not_fatal() {
        let store = TileStore::new("/definitely/not/a/real/tiles/dir");
        assert!(store.get_or_open(TileId::new(45, 6)).is_none());
    }

    #[test]
    fn test_close_all() {
        let dir = TempDir::new().unwrap();
        let id = TileId::new(45, 6);
        create_test_tile(dir.path(), id, 500.0);

        let store = TileStore::new(dir.path());
        assert!(store.get_or_open(id).is_some());

        store.close_all();
        assert!(store.is_closed());
        // Closed store does not reopen, even for previously cached tiles
        assert!(store.get_or_open(id).is_none());
    }

    #[test]
    fn test_concurrent_first_access_single_handle() {
        let dir = TempDir::new().unwrap();
        let id = TileId::new(45, 6);
        create_test_tile(dir.path(), id, 500.0);

        let store = Arc::new(TileStore::new(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.get_or_open(id).unwrap())
            })
            .collect();

        let tiles: Vec<Arc<RasterTile>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Every thread got the same handle
        for tile in &tiles[1..] {
            assert!(Arc::ptr_eq(&tiles[0], tile));
        }
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            entry_count: 5,
            hit_count: 80,
            miss_count: 20,
        };
        assert_eq!(stats.hit_rate(), 0.8);

        let empty = CacheStats::default();
        assert_eq!(empty.hit_rate(), 0.0);
    }

    #[test]
    fn test_from_env_missing_var() {
        let original = std::env::var("COPDEM_TILES_DIR").ok();
        std::env::remove_var("COPDEM_TILES_DIR");

        assert!(TileStore::from_env().is_err());

        if let Some(val) = original {
            std::env::set_var("COPDEM_TILES_DIR", val);
        }
    }

    #[test]
    fn test_scan_tile_files() {
        let dir = TempDir::new().unwrap();
        create_test_tile(dir.path(), TileId::new(45, 6), 100.0);
        create_test_tile(dir.path(), TileId::new(46, 7), 200.0);
        std::fs::write(dir.path().join("readme.txt"), "not a tile").unwrap();

        let store = TileStore::new(dir.path());
        let files = store.scan_tile_files();

        assert_eq!(files.len(), 2);
        assert_eq!(files[0], "Copernicus_DSM_COG_10_N45_00_E006_00_DEM.tif");
        assert_eq!(files[1], "Copernicus_DSM_COG_10_N46_00_E007_00_DEM.tif");
    }

    #[test]
    fn test_preload_all_tiles() {
        let dir = TempDir::new().unwrap();
        create_test_tile(dir.path(), TileId::new(45, 6), 100.0);
        create_test_tile(dir.path(), TileId::new(46, 7), 200.0);

        let store = TileStore::new(dir.path());
        let stats = store.preload(None);

        assert_eq!(stats.tiles_matched, 2);
        assert_eq!(stats.tiles_loaded, 2);
        assert_eq!(stats.tiles_failed, 0);
    }

    #[test]
    fn test_preload_with_bounding_box() {
        let dir = TempDir::new().unwrap();
        create_test_tile(dir.path(), TileId::new(45, 6), 100.0);
        create_test_tile(dir.path(), TileId::new(50, 10), 200.0);

        let store = TileStore::new(dir.path());
        // Around the Mont Blanc massif only
        let bbox = BoundingBox::new(45.0, 6.0, 46.0, 7.0);
        let stats = store.preload(Some(&[bbox]));

        assert_eq!(stats.tiles_matched, 1);
        assert_eq!(stats.tiles_loaded, 1);
    }

    #[test]
    fn test_preload_already_cached() {
        let dir = TempDir::new().unwrap();
        create_test_tile(dir.path(), TileId::new(45, 6), 100.0);

        let store = TileStore::new(dir.path());
        let first = store.preload(None);
        assert_eq!(first.tiles_loaded, 1);

        let second = store.preload(None);
        assert_eq!(second.tiles_loaded, 0);
        assert_eq!(second.tiles_already_cached, 1);
    }

    #[test]
    fn test_bounding_box_overlaps_tile() {
        // Tile N45E006 covers [45, 46) x [6, 7)
        let bbox = BoundingBox::new(45.5, 6.5, 46.5, 7.5);
        assert!(bbox.overlaps_tile(TileId::new(45, 6)));

        // Completely outside
        let bbox = BoundingBox::new(50.0, 10.0, 51.0, 11.0);
        assert!(!bbox.overlaps_tile(TileId::new(45, 6)));

        // Touching edge (exclusive boundary)
        let bbox = BoundingBox::new(46.0, 7.0, 47.0, 8.0);
        assert!(!bbox.overlaps_tile(TileId::new(45, 6)));

        // Negative coordinates
        let bbox = BoundingBox::new(-13.5, -78.5, -11.5, -76.5);
        assert!(bbox.overlaps_tile(TileId::new(-13, -78)));
    }
}
