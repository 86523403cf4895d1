use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Copernicus DEM elevation CLI tool
#[derive(Parser)]
#[command(name = "copdem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing Copernicus DEM GeoTIFF tiles
    #[arg(short, long, env = "COPDEM_TILES_DIR", global = true)]
    tiles_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query elevation for a single coordinate
    Query {
        /// Latitude in decimal degrees
        #[arg(long)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long)]
        lon: f64,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Augment a file of coordinates with ground elevation
    Batch {
        /// Input file (.csv, .json or .geojson)
        input: PathBuf,

        /// Output file (derived from the input name if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for latitude (CSV only)
        #[arg(long, default_value = "lat")]
        lat_col: String,

        /// Column name for longitude (CSV only)
        #[arg(long, default_value = "lon")]
        lon_col: String,
    },

    /// Display information about a DEM tile
    Info {
        /// Tile file path, file name, or cell tag (e.g., N47_00_E009_00)
        tile: Option<String>,

        /// Specify the tile by latitude instead of name
        #[arg(long, requires = "lon", conflicts_with = "tile")]
        lat: Option<f64>,

        /// Specify the tile by longitude instead of name
        #[arg(long, requires = "lat", conflicts_with = "tile")]
        lon: Option<f64>,
    },

    /// List available DEM tiles
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { lat, lon, json } => commands::query::run(cli.tiles_dir, lat, lon, json),
        Commands::Batch {
            input,
            output,
            lat_col,
            lon_col,
        } => commands::batch::run(cli.tiles_dir, input, output, lat_col, lon_col),
        Commands::Info { tile, lat, lon } => commands::info::run(cli.tiles_dir, tile, lat, lon),
        Commands::List => commands::list::run(cli.tiles_dir),
    }
}
