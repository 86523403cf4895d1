use anyhow::{bail, Context, Result};
use copdem::cell::{TILE_PREFIX, TILE_SUFFIX};
use copdem::{RasterTile, TileId};
use std::path::PathBuf;

pub fn run(
    tiles_dir: Option<PathBuf>,
    tile: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<()> {
    // Determine the tile id and path
    let (id, tile_path) = if let (Some(lat), Some(lon)) = (lat, lon) {
        let id = TileId::for_coord(lat, lon);
        (id, resolve_tile_path(tiles_dir, id)?)
    } else if let Some(tile) = tile {
        if tile.ends_with(".tif") {
            // Full path or file name provided
            let path = PathBuf::from(&tile);
            let id = TileId::from_file_name(&tile)
                .with_context(|| format!("Not a Copernicus tile name: {}", tile))?;
            if path.components().count() > 1 {
                (id, path)
            } else {
                (id, resolve_tile_path(tiles_dir, id)?)
            }
        } else {
            // Bare cell tag (e.g., N47_00_E009_00)
            let id = TileId::from_file_name(&format!("{}{}{}", TILE_PREFIX, tile, TILE_SUFFIX))
                .with_context(|| format!("Not a cell tag: {}", tile))?;
            (id, resolve_tile_path(tiles_dir, id)?)
        }
    } else {
        bail!("Specify a tile name, or both --lat and --lon");
    };

    if !tile_path.exists() {
        bail!("Tile not found: {}", tile_path.display());
    }

    let file_size = std::fs::metadata(&tile_path)?.len();
    let tile = RasterTile::open(&tile_path, id).context("Failed to open tile")?;
    let (width, height) = tile.dimensions();
    let transform = tile.transform();

    // Scan the grid for elevation range and missing samples
    let mut min_elev = f64::MAX;
    let mut max_elev = f64::MIN;
    let mut missing = 0u64;

    for row in 0..height {
        for col in 0..width {
            match tile.pixel(row, col) {
                Some(elev) => {
                    min_elev = min_elev.min(elev);
                    max_elev = max_elev.max(elev);
                }
                None => missing += 1,
            }
        }
    }

    println!("Tile: {}", id);
    println!("Path: {}", tile_path.display());
    println!();
    println!("Dimensions: {}x{} pixels", width, height);
    println!(
        "Coverage: {}..{} lat, {}..{} lon",
        id.lat(),
        id.lat() + 1,
        id.lon(),
        id.lon() + 1
    );
    println!(
        "Pixel scale: {:.6}° x {:.6}°",
        transform.pixel_width, transform.pixel_height
    );
    match tile.nodata() {
        Some(nodata) => println!("Nodata sentinel: {}", nodata),
        None => println!("Nodata sentinel: none"),
    }
    println!("File size: {}", format_size(file_size));
    println!();

    if min_elev <= max_elev {
        println!("Min elevation: {:.1}m", min_elev);
        println!("Max elevation: {:.1}m", max_elev);
    }

    let total = u64::from(width) * u64::from(height);
    if missing > 0 {
        let pct = (missing as f64 / total as f64) * 100.0;
        println!("Missing samples: {} ({:.1}%)", missing, pct);
    }

    Ok(())
}

fn resolve_tile_path(tiles_dir: Option<PathBuf>, id: TileId) -> Result<PathBuf> {
    match tiles_dir {
        Some(dir) => Ok(dir.join(id.file_name())),
        None => {
            let dir = std::env::var("COPDEM_TILES_DIR").context(
                "COPDEM_TILES_DIR environment variable not set. Use --tiles-dir or set COPDEM_TILES_DIR",
            )?;
            Ok(PathBuf::from(dir).join(id.file_name()))
        }
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
