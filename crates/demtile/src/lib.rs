//! # demtile
//!
//! Elevation lookup from RGB-encoded DEM raster tiles.
//!
//! This crate answers one question: what is the ground elevation at a
//! coordinate, at a given tile resolution? It does so in three steps:
//! - **Projection**: latitude/longitude/zoom to a Web Mercator tile index and
//!   the pixel inside that tile
//! - **Fetch**: obtain the 256x256 RGBA raster for the tile
//! - **Decode**: turn the pixel's RGB channels into meters
//!
//! ## Overview
//!
//! ### DEM PNG Tiles
//!
//! The Geospatial Information Authority of Japan publishes elevation as PNG
//! tiles where each pixel stores `x = R·2^16 + G·2^8 + B`:
//! - `x < 2^23` is `x · 0.01` meters
//! - `x = 2^23` is "no data" (sea, voids)
//! - `x > 2^23` is `(x - 2^24) · 0.01` meters
//!
//! Tiles are fetched from:
//! `https://cyberjapandata.gsi.go.jp/xyz/{dataset}/{z}/{x}/{y}.png`
//!
//! ## Examples
//!
//! ### Locating a tile
//!
//! ```
//! use demtile::tile_info;
//!
//! let info = tile_info(35.0, 135.0, 15);
//! assert_eq!((info.tile.x, info.tile.y), (28672, 12979));
//! assert!(info.offset.x < 256 && info.offset.y < 256);
//! ```
//!
//! ### Querying an elevation
//!
//! ```no_run
//! use demtile::{get_elevation, Elevation, QueryConfig};
//!
//! # async fn run() -> demtile::Result<()> {
//! let config = QueryConfig::default(); // zoom 15, dem5a_png
//! match get_elevation(35.3606, 138.7274, &config).await? {
//!     Elevation::Meters(m) => println!("Mt. Fuji: {} meters", m),
//!     Elevation::NoData => println!("no data"),
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod decode;
mod error;
mod fetch;
mod projection;
mod query;
mod tile;

pub use config::{QueryConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_ZOOM};
pub use decode::{
    decode_elevation, encoded_value, DemEncoding, Elevation, DEFAULT_RESOLUTION, NO_DATA_VALUE,
};
pub use error::DemError;
pub use fetch::{
    decode_tile_image, AsyncHttpClient, DownloadStats, FetchError, HttpTileSource, ReqwestClient,
    TileDataset, TileSource, TileUrlTemplate, DEFAULT_DATASET, DEFAULT_EXTENSION,
    DEFAULT_URL_TEMPLATE,
};
pub use projection::{
    latitude_to_y, longitude_to_x, tile_info, AxisPosition, GeoCoordinate, TileBounds, TileIndex,
    TileInfo, TileOffset, MAX_LATITUDE, MAX_ZOOM, TILE_SIZE,
};
pub use query::{get_elevation, ElevationQuery};
pub use tile::{RasterTile, TILE_BYTES};

/// Result type for DEM operations.
pub type Result<T> = std::result::Result<T, DemError>;
