//! RGB-encoded elevation decoding.
//!
//! Each pixel stores a 24-bit value `x = R·2^16 + G·2^8 + B` which is read as
//! a signed quantity in units of `u` meters:
//! - `x < 2^23`: `h = x·u`
//! - `x = 2^23`: no data
//! - `x > 2^23`: `h = (x - 2^24)·u`
//!
//! The Geospatial Information Authority of Japan DEM PNG tiles use `u = 0.01`.

use crate::projection::TileOffset;
use crate::tile::pixel_index;
use crate::{DemError, Result};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Reserved value marking a pixel without elevation data.
pub const NO_DATA_VALUE: u32 = 1 << 23;

/// Size of the 24-bit value space.
const VALUE_RANGE: i64 = 1 << 24;

/// Default resolution of GSI DEM PNG tiles, in meters per unit.
pub const DEFAULT_RESOLUTION: f64 = 0.01;

/// A decoded elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Elevation {
    /// Elevation in meters.
    Meters(f64),
    /// The dataset has no value for this pixel.
    NoData,
}

impl Elevation {
    /// Elevation in meters, or `None` for a no-data pixel.
    pub fn meters(&self) -> Option<f64> {
        match self {
            Elevation::Meters(m) => Some(*m),
            Elevation::NoData => None,
        }
    }

    /// Whether this is the no-data marker.
    pub fn is_no_data(&self) -> bool {
        matches!(self, Elevation::NoData)
    }
}

impl std::fmt::Display for Elevation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Elevation::Meters(m) => write!(f, "{:.2} m", m),
            Elevation::NoData => f.write_str("no data"),
        }
    }
}

/// Parameters of the RGB elevation encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemEncoding {
    /// Meters per encoded unit.
    pub resolution: f64,
}

impl Default for DemEncoding {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl DemEncoding {
    /// Create an encoding with the given resolution in meters per unit.
    pub fn new(resolution: f64) -> Self {
        Self { resolution }
    }

    /// Decode a raw 24-bit value.
    pub fn decode_value(&self, value: u32) -> Elevation {
        match value.cmp(&NO_DATA_VALUE) {
            std::cmp::Ordering::Less => Elevation::Meters(value as f64 * self.resolution),
            std::cmp::Ordering::Equal => Elevation::NoData,
            std::cmp::Ordering::Greater => {
                Elevation::Meters((value as i64 - VALUE_RANGE) as f64 * self.resolution)
            }
        }
    }

    /// Decode the red, green and blue channels of a pixel.
    pub fn decode_rgb(&self, r: u8, g: u8, b: u8) -> Elevation {
        self.decode_value(encoded_value(r, g, b))
    }
}

/// Combine three channels into the 24-bit encoded value.
pub fn encoded_value(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Decode the elevation at `offset` in a 256x256 RGBA buffer.
///
/// Alpha is ignored. Fails if the offset is outside the tile or the buffer is
/// too short to contain the pixel.
pub fn decode_elevation(
    pixels: &[u8],
    offset: TileOffset,
    encoding: &DemEncoding,
) -> Result<Elevation> {
    let idx = pixel_index(offset)?;
    let rgb = pixels.get(idx..idx + 3).ok_or(DemError::BufferTooShort {
        needed: idx + 3,
        len: pixels.len(),
    })?;

    let value = encoded_value(rgb[0], rgb[1], rgb[2]);
    trace!(x = offset.x, y = offset.y, value, "decoded pixel");
    Ok(encoding.decode_value(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TILE_BYTES;
    use approx::assert_relative_eq;

    fn gsi() -> DemEncoding {
        DemEncoding::default()
    }

    #[test]
    fn test_encoded_value() {
        assert_eq!(encoded_value(0, 0, 0), 0);
        assert_eq!(encoded_value(1, 0, 0), 1 << 16);
        assert_eq!(encoded_value(0, 1, 0), 1 << 8);
        assert_eq!(encoded_value(0, 0, 1), 1);
        assert_eq!(encoded_value(128, 0, 0), NO_DATA_VALUE);
        assert_eq!(encoded_value(255, 255, 255), (1 << 24) - 1);
    }

    #[test]
    fn test_no_data_boundary() {
        assert_eq!(gsi().decode_value(1 << 23), Elevation::NoData);
        assert_eq!(gsi().decode_rgb(128, 0, 0), Elevation::NoData);
    }

    #[test]
    fn test_just_below_boundary_is_positive() {
        let h = gsi().decode_value((1 << 23) - 1).meters().unwrap();
        assert_relative_eq!(h, ((1 << 23) - 1) as f64 * 0.01);
        assert!(h > 0.0);
    }

    #[test]
    fn test_just_above_boundary_is_negative() {
        let h = gsi().decode_value((1 << 23) + 1).meters().unwrap();
        assert_relative_eq!(h, ((1i64 << 23) + 1 - (1i64 << 24)) as f64 * 0.01);
        assert_relative_eq!(h, -83_886.07, epsilon = 1e-6);
    }

    #[test]
    fn test_sea_level_neighbours() {
        assert_eq!(gsi().decode_value(0), Elevation::Meters(0.0));
        assert_relative_eq!(gsi().decode_rgb(0, 0, 1).meters().unwrap(), 0.01);
        assert_relative_eq!(
            gsi().decode_rgb(255, 255, 255).meters().unwrap(),
            -0.01,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_mt_fuji_summit() {
        // 3776.24 m
        let value: u32 = 377_624;
        let r = (value >> 16) as u8;
        let g = ((value >> 8) & 0xFF) as u8;
        let b = (value & 0xFF) as u8;
        assert_relative_eq!(gsi().decode_rgb(r, g, b).meters().unwrap(), 3776.24, epsilon = 1e-9);
    }

    #[test]
    fn test_custom_resolution() {
        let enc = DemEncoding::new(0.1);
        assert_relative_eq!(enc.decode_value(100).meters().unwrap(), 10.0);
    }

    #[test]
    fn test_decode_elevation_pixel_addressing() {
        let mut pixels = vec![0u8; TILE_BYTES];
        let idx = 20 * 256 * 4 + 10 * 4;
        pixels[idx] = 1;

        let elevation = decode_elevation(&pixels, TileOffset::new(10, 20), &gsi()).unwrap();
        assert_relative_eq!(elevation.meters().unwrap(), 65536.0 * 0.01);

        let neighbour = decode_elevation(&pixels, TileOffset::new(11, 20), &gsi()).unwrap();
        assert_eq!(neighbour, Elevation::Meters(0.0));
    }

    #[test]
    fn test_decode_elevation_ignores_alpha() {
        let mut pixels = vec![0u8; TILE_BYTES];
        pixels[3] = 255;
        let elevation = decode_elevation(&pixels, TileOffset::new(0, 0), &gsi()).unwrap();
        assert_eq!(elevation, Elevation::Meters(0.0));
    }

    #[test]
    fn test_decode_elevation_rejects_bad_input() {
        let pixels = vec![0u8; 16];
        assert!(matches!(
            decode_elevation(&pixels, TileOffset::new(10, 20), &gsi()),
            Err(DemError::BufferTooShort {
                needed: 20_523,
                len: 16
            })
        ));
        let err = decode_elevation(&pixels, TileOffset::new(10, 20), &gsi()).unwrap_err();
        assert_eq!(err.to_string(), "Pixel buffer too short: need 20523 bytes, got 16");
        let pixels = vec![0u8; TILE_BYTES];
        assert!(matches!(
            decode_elevation(&pixels, TileOffset::new(0, 256), &gsi()),
            Err(DemError::OffsetOutOfRange { x: 0, y: 256 })
        ));
    }

    #[test]
    fn test_elevation_accessors() {
        assert_eq!(Elevation::Meters(12.5).meters(), Some(12.5));
        assert_eq!(Elevation::NoData.meters(), None);
        assert!(Elevation::NoData.is_no_data());
        assert!(!Elevation::Meters(0.0).is_no_data());
        assert_eq!(Elevation::Meters(12.5).to_string(), "12.50 m");
        assert_eq!(Elevation::NoData.to_string(), "no data");
    }
}
