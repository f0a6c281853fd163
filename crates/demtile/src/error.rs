//! Error types for the demtile crate.

use thiserror::Error;

/// Errors that can occur when resolving an elevation.
///
/// A "no data" pixel is not an error; it is reported as
/// [`Elevation::NoData`](crate::Elevation::NoData).
#[derive(Debug, Error)]
pub enum DemError {
    /// Latitude is non-finite or outside the Web Mercator range.
    #[error("Invalid latitude {0} (must be finite and within ±85.05112878°)")]
    InvalidLatitude(f64),

    /// Longitude is non-finite or outside [-180, 180).
    #[error("Invalid longitude {0} (must be finite and within [-180°, 180°))")]
    InvalidLongitude(f64),

    /// Invalid zoom level.
    #[error("Invalid zoom level {0} (must be 0-24)")]
    InvalidZoomLevel(u8),

    /// The tile could not be retrieved or decoded.
    #[error("Tile z={z} x={x} y={y} unavailable: {reason}")]
    TileUnavailable {
        /// Zoom level.
        z: u8,
        /// X tile coordinate.
        x: i64,
        /// Y tile coordinate.
        y: i64,
        /// Reason for failure.
        reason: String,
    },

    /// Pixel buffer does not have the shape of a 256x256 RGBA tile.
    #[error("Invalid raster: {width}x{height} with {len} bytes (expected 256x256 RGBA)")]
    InvalidRaster {
        /// Reported width in pixels.
        width: u32,
        /// Reported height in pixels.
        height: u32,
        /// Buffer length in bytes.
        len: usize,
    },

    /// Pixel buffer ends before the addressed pixel.
    #[error("Pixel buffer too short: need {needed} bytes, got {len}")]
    BufferTooShort {
        /// Bytes required to read the pixel.
        needed: usize,
        /// Buffer length in bytes.
        len: usize,
    },

    /// Pixel offset lies outside the tile.
    #[error("Pixel offset ({x}, {y}) is outside the 256x256 tile")]
    OffsetOutOfRange {
        /// Column within the tile.
        x: u32,
        /// Row within the tile.
        y: u32,
    },

    /// HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration is invalid or could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// I/O error reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The query was cancelled before the tile arrived.
    #[error("Elevation query cancelled")]
    Cancelled,
}

impl DemError {
    /// Whether this error means the tile itself could not be obtained.
    pub fn is_tile_unavailable(&self) -> bool {
        matches!(self, DemError::TileUnavailable { .. })
    }
}
