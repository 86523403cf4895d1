use anyhow::{Context, Result};
use copdem::{Sampler, TileStore};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Serialize)]
struct ElevationResponse {
    lat: f64,
    lon: f64,
    ground_elevation: Option<f64>,
}

pub fn run(tiles_dir: Option<PathBuf>, lat: f64, lon: f64, json: bool) -> Result<()> {
    let store = match tiles_dir {
        Some(dir) => TileStore::new(dir),
        None => TileStore::from_env().context(
            "COPDEM_TILES_DIR environment variable not set. Use --tiles-dir or set COPDEM_TILES_DIR",
        )?,
    };
    let sampler = Sampler::new(Arc::new(store));

    let elevation = sampler.sample(lat, lon);

    if json {
        let response = ElevationResponse {
            lat,
            lon,
            ground_elevation: elevation,
        };
        println!("{}", serde_json::to_string(&response)?);
    } else {
        match elevation {
            Some(elev) => println!("{:.2}", elev),
            None => println!("unavailable"),
        }
    }

    Ok(())
}
