//! Basic example demonstrating copdem library usage.
//!
//! Run with: cargo run --example basic -- /path/to/copernicus/tiles

use std::env;
use std::sync::Arc;

use copdem::{Sampler, TileStore};

fn main() {
    // Get tiles directory from command line
    let tiles_dir = env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example basic -- /path/to/copernicus/tiles");
        std::process::exit(1);
    });

    let store = Arc::new(TileStore::new(&tiles_dir));
    let sampler = Sampler::new(Arc::clone(&store));

    // Query some famous peaks
    let locations = [
        ("Mont Blanc, France", 45.8326, 6.8652),
        ("Matterhorn, Switzerland", 45.9766, 7.6585),
        ("Zugspitze, Germany", 47.4211, 10.9853),
    ];

    println!("Elevation queries:");
    println!("{:-<50}", "");

    for (name, lat, lon) in &locations {
        match sampler.sample(*lat, *lon) {
            Some(elevation) => println!("{}: {:.1}m", name, elevation),
            None => println!("{}: tile not available locally", name),
        }
    }

    // Show cache statistics
    let stats = store.cache_stats();
    println!("\nCache statistics:");
    println!("  Cached tiles: {}", stats.entry_count);
    println!("  Hits: {}", stats.hit_count);
    println!("  Misses: {}", stats.miss_count);
    println!("  Hit rate: {:.1}%", stats.hit_rate() * 100.0);

    store.close_all();
}
