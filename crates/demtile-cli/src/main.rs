//! demtile command-line tool.
//!
//! Looks up ground elevation from DEM PNG tiles, or prints the tile address
//! and URL a coordinate resolves to.

use clap::{Args, Parser, Subcommand};
use demtile::{
    DemError, Elevation, ElevationQuery, GeoCoordinate, QueryConfig, TileInfo, TileUrlTemplate,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

/// Elevation lookup from DEM tiles
#[derive(Parser, Debug)]
#[command(name = "demtile")]
#[command(about = "Look up ground elevation from RGB-encoded DEM tiles")]
#[command(version)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the tile and print the elevation at a coordinate
    #[command(allow_negative_numbers = true)]
    Elevation(QueryArgs),
    /// Print the tile index, pixel offset and tile bounds for a coordinate
    #[command(allow_negative_numbers = true)]
    Tile(QueryArgs),
    /// Print the URL of the tile containing a coordinate
    #[command(allow_negative_numbers = true)]
    Url(QueryArgs),
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Latitude in degrees
    latitude: f64,

    /// Longitude in degrees
    longitude: f64,

    /// Zoom level
    #[arg(short, long)]
    zoom: Option<u8>,

    /// Dataset identifier, e.g. dem5a_png
    #[arg(short, long)]
    dataset: Option<String>,

    /// Tile file extension
    #[arg(long)]
    ext: Option<String>,
}

impl QueryArgs {
    /// Apply command-line overrides on top of `config`.
    fn apply(&self, mut config: QueryConfig) -> Result<QueryConfig, CliError> {
        if let Some(zoom) = self.zoom {
            config.zoom = zoom;
        }
        if let Some(dataset) = &self.dataset {
            config.dataset = dataset.clone();
        }
        if let Some(ext) = &self.ext {
            config.extension = ext.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Dem(#[from] DemError),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ElevationOutput {
    latitude: f64,
    longitude: f64,
    zoom: u8,
    dataset: String,
    elevation: Elevation,
}

#[derive(Debug, Serialize)]
struct TileOutput {
    z: u8,
    x: i64,
    y: i64,
    px: u32,
    py: u32,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

impl From<TileInfo> for TileOutput {
    fn from(info: TileInfo) -> Self {
        let bounds = info.tile.bounds();
        Self {
            z: info.tile.z,
            x: info.tile.x,
            y: info.tile.y,
            px: info.offset.x,
            py: info.offset.y,
            min_lat: bounds.min_lat,
            max_lat: bounds.max_lat,
            min_lon: bounds.min_lon,
            max_lon: bounds.max_lon,
        }
    }
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<QueryConfig, CliError> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            Ok(QueryConfig::from_file(path)?)
        }
        None => Ok(QueryConfig::default()),
    }
}

/// URL of the tile containing a coordinate. No HTTP client is built.
fn tile_url(config: &QueryConfig, latitude: f64, longitude: f64) -> Result<String, CliError> {
    let info = GeoCoordinate::new(latitude, longitude)?.tile_info(config.zoom);
    let template = TileUrlTemplate::new(&config.url_template)?;
    Ok(template.render(&info.tile, &config.tile_dataset()))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let base = load_config(cli.config.as_ref())?;

    match &cli.command {
        Command::Elevation(args) => {
            let config = args.apply(base)?;
            let dataset = config.dataset.clone();
            let zoom = config.zoom;
            let query = ElevationQuery::from_config(config)?;
            let elevation = query.elevation(args.latitude, args.longitude).await?;

            if cli.json {
                let output = ElevationOutput {
                    latitude: args.latitude,
                    longitude: args.longitude,
                    zoom,
                    dataset,
                    elevation,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", elevation);
            }
        }
        Command::Tile(args) => {
            let config = args.apply(base)?;
            let info = GeoCoordinate::new(args.latitude, args.longitude)?.tile_info(config.zoom);
            let output = TileOutput::from(info);

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("tile:   {}", info.tile);
                println!("pixel:  ({}, {})", output.px, output.py);
                println!(
                    "bounds: lat {:.6} to {:.6}, lon {:.6} to {:.6}",
                    output.min_lat, output.max_lat, output.min_lon, output.max_lon
                );
            }
        }
        Command::Url(args) => {
            let config = args.apply(base)?;
            let url = tile_url(&config, args.latitude, args.longitude)?;

            if cli.json {
                println!("{}", serde_json::json!({ "url": url }));
            } else {
                println!("{}", url);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(e) = run(cli).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    #[test]
    fn test_parse_elevation_with_negative_coordinates() {
        let cli = parse(&["demtile", "elevation", "-33.8688", "-151.2093", "--zoom", "12"]);
        match cli.command {
            Command::Elevation(args) => {
                assert_eq!(args.latitude, -33.8688);
                assert_eq!(args.longitude, -151.2093);
                assert_eq!(args.zoom, Some(12));
            }
            other => panic!("Expected elevation command, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["demtile", "tile", "35", "135", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Tile(_)));
    }

    #[test]
    fn test_overrides_apply_on_top_of_config() {
        let cli = parse(&[
            "demtile", "url", "35", "135", "--dataset", "dem_png", "--zoom", "14",
        ]);
        let Command::Url(args) = cli.command else {
            panic!("Expected url command");
        };
        let config = args.apply(QueryConfig::default()).unwrap();
        assert_eq!(config.dataset, "dem_png");
        assert_eq!(config.zoom, 14);
        assert_eq!(config.extension, "png");
    }

    #[test]
    fn test_invalid_override_rejected() {
        let cli = parse(&["demtile", "tile", "35", "135", "--zoom", "40"]);
        let Command::Tile(args) = cli.command else {
            panic!("Expected tile command");
        };
        assert!(matches!(
            args.apply(QueryConfig::default()),
            Err(CliError::Dem(DemError::InvalidZoomLevel(40)))
        ));
    }

    #[test]
    fn test_tile_url() {
        let config = QueryConfig {
            zoom: 14,
            dataset: "dem_png".to_string(),
            ..QueryConfig::default()
        };
        assert_eq!(
            tile_url(&config, 35.0, 135.0).unwrap(),
            "https://cyberjapandata.gsi.go.jp/xyz/dem_png/14/14336/6489.png"
        );
        assert!(matches!(
            tile_url(&config, 35.0, 180.0),
            Err(CliError::Dem(DemError::InvalidLongitude(_)))
        ));
    }

    #[test]
    fn test_tile_output() {
        let info = GeoCoordinate::new(35.0, 135.0).unwrap().tile_info(15);
        let output = TileOutput::from(info);
        assert_eq!((output.z, output.x, output.y), (15, 28672, 12979));
        assert!(output.min_lon <= 135.0 && 135.0 <= output.max_lon);
        assert!(output.min_lat <= 35.0 && 35.0 <= output.max_lat);
    }
}
