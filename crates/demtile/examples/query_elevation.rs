//! Example: Query elevation from GSI DEM tiles.
//!
//! Usage: cargo run --example query_elevation -- <lat> <lon> [dataset]

use demtile::{ElevationQuery, QueryConfig, TileDataset};
use std::env;
use std::time::Instant;

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <lat> <lon> [dataset]", args[0]);
        eprintln!("Example: {} 35.3606 138.7274 dem5a_png", args[0]);
        std::process::exit(1);
    }

    let lat: f64 = args[1].parse().expect("Invalid latitude");
    let lon: f64 = args[2].parse().expect("Invalid longitude");
    let dataset = TileDataset::png(args.get(3).map(|s| s.as_str()).unwrap_or("dem5a_png"));

    let config = QueryConfig {
        zoom: dataset.native_zoom().unwrap_or(15),
        dataset: dataset.id.clone(),
        ..QueryConfig::default()
    };
    let query = ElevationQuery::from_config(config).expect("Failed to create query");

    let info = query.locate(lat, lon).expect("Invalid coordinate");
    println!(
        "Tile {} pixel ({}, {}) -> {}",
        info.tile,
        info.offset.x,
        info.offset.y,
        query.source().tile_url(&info.tile)
    );

    let start = Instant::now();
    match query.elevation(lat, lon).await {
        Ok(elevation) => {
            println!(
                "Elevation: {} (fetched in {:.2}s)",
                elevation,
                start.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    let stats = query.source().download_stats();
    println!(
        "Downloaded {} tile(s), {} bytes",
        stats.tiles_downloaded, stats.bytes_downloaded
    );
}
