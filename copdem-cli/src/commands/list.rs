use anyhow::{Context, Result};
use copdem::TileId;
use std::fs;
use std::path::PathBuf;

pub fn run(tiles_dir: Option<PathBuf>) -> Result<()> {
    let dir = match tiles_dir {
        Some(dir) => dir,
        None => {
            let dir = std::env::var("COPDEM_TILES_DIR").context(
                "COPDEM_TILES_DIR environment variable not set. Use --tiles-dir or set COPDEM_TILES_DIR",
            )?;
            PathBuf::from(dir)
        }
    };

    if !dir.exists() {
        anyhow::bail!("Tiles directory does not exist: {}", dir.display());
    }

    // Collect tile files following the Copernicus naming convention
    let mut tiles: Vec<_> = fs::read_dir(&dir)
        .context("Failed to read tiles directory")?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            TileId::from_file_name(&name).map(|id| (id, entry.path()))
        })
        .collect();

    if tiles.is_empty() {
        println!("No Copernicus DEM tiles found in: {}", dir.display());
        return Ok(());
    }

    // Sort by cell
    tiles.sort_by_key(|(id, _)| (id.lat(), id.lon()));

    let mut total_size: u64 = 0;

    println!("{:<16} {:>10} {:>28}", "TILE", "SIZE", "COVERAGE");
    println!("{}", "-".repeat(56));

    for (id, path) in &tiles {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        total_size += size;

        let coverage = format!(
            "{}..{} lat, {}..{} lon",
            id.lat(),
            id.lat() + 1,
            id.lon(),
            id.lon() + 1
        );

        println!("{:<16} {:>10} {:>28}", id.to_string(), format_size(size), coverage);
    }

    println!();
    println!("Summary:");
    println!("  Total tiles: {}", tiles.len());
    println!("  Total size: {}", format_size(total_size));
    println!("  Tiles directory: {}", dir.display());

    Ok(())
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
