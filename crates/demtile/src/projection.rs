//! Spherical Web Mercator projection from geographic coordinates to tile space.
//!
//! ## Coordinate System
//!
//! At zoom 0 the whole world is a single 256x256 pixel image. Each zoom level
//! doubles the pixel extent along both axes:
//! - world coordinates are in `[0, 256)` at every zoom, origin top-left
//! - pixel coordinates are world coordinates scaled by `2^zoom`
//! - tile indices are `floor(pixel / 256)`; `x` grows eastward, `y` southward
//! - offsets are the pixel position inside that tile, always in `0..256`
//!
//! The functions here are pure and do not validate their input. Longitude is
//! not normalized and latitude at or beyond ±85.05112878° is undefined.
//! Use [`GeoCoordinate::new`] to reject such input before projecting.

use crate::{DemError, Result};
use std::f64::consts::PI;

/// Tile edge length in pixels.
pub const TILE_SIZE: u32 = 256;

/// Latitude limit of the Web Mercator square (`atan(sinh(π))`).
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Largest zoom level accepted by the query layer.
pub const MAX_ZOOM: u8 = 24;

/// Pixels per radian at zoom 0.
const PIXELS_PER_RADIAN: f64 = TILE_SIZE as f64 / (2.0 * PI);

/// Half the zoom-0 world width; moves the origin from the meridian/equator to the top-left.
const WORLD_CENTER: f64 = TILE_SIZE as f64 / 2.0;

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoCoordinate {
    latitude: f64,
    longitude: f64,
}

impl GeoCoordinate {
    /// Create a coordinate, rejecting values the projection cannot handle.
    ///
    /// Latitude must be finite and strictly inside ±[`MAX_LATITUDE`].
    /// Longitude must be finite and within [-180, 180). 180° itself would
    /// project one tile past the eastern edge of the world.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || latitude.abs() >= MAX_LATITUDE {
            return Err(DemError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..180.0).contains(&longitude) {
            return Err(DemError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Tile and offset containing this coordinate at `zoom`.
    ///
    /// See [`tile_info`] for the zoom precondition.
    pub fn tile_info(&self, zoom: u8) -> TileInfo {
        tile_info(self.latitude, self.longitude, zoom)
    }
}

/// Projection of one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisPosition {
    /// Position in zoom-0 pixel space, `[0, 256)` for in-range input.
    pub world: f64,
    /// Position in pixel space at the requested zoom.
    pub pixel: f64,
    /// Index of the tile containing `pixel`.
    pub tile: i64,
    /// Pixel within that tile.
    pub offset: u32,
}

impl AxisPosition {
    fn from_world(world: f64, zoom: u8) -> Self {
        let pixel = world * 2f64.powi(zoom as i32);
        let tile = (pixel / TILE_SIZE as f64).floor();
        let offset = (pixel - tile * TILE_SIZE as f64).floor();
        Self {
            world,
            pixel,
            tile: tile as i64,
            offset: offset as u32,
        }
    }
}

/// XYZ tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileIndex {
    /// Column, 0 at 180°W.
    pub x: i64,
    /// Row, 0 at the northern limit.
    pub y: i64,
    /// Zoom level.
    pub z: u8,
}

impl TileIndex {
    /// Create a tile index.
    pub fn new(x: i64, y: i64, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Number of tiles along each axis at this zoom, or `None` above [`MAX_ZOOM`].
    pub fn tiles_per_axis(&self) -> Option<i64> {
        (self.z <= MAX_ZOOM).then(|| 1i64 << self.z)
    }

    /// Whether the index addresses a tile that exists at its zoom level.
    ///
    /// Indices above [`MAX_ZOOM`] are never valid.
    pub fn is_valid(&self) -> bool {
        match self.tiles_per_axis() {
            Some(n) => (0..n).contains(&self.x) && (0..n).contains(&self.y),
            None => false,
        }
    }

    /// Geographic extent of the tile.
    pub fn bounds(&self) -> TileBounds {
        let n = 2f64.powi(self.z as i32);

        let min_lon = self.x as f64 / n * 360.0 - 180.0;
        let max_lon = (self.x + 1) as f64 / n * 360.0 - 180.0;

        let max_lat = (PI * (1.0 - 2.0 * self.y as f64 / n)).sinh().atan().to_degrees();
        let min_lat = (PI * (1.0 - 2.0 * (self.y + 1) as f64 / n))
            .sinh()
            .atan()
            .to_degrees();

        TileBounds {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }
}

impl std::fmt::Display for TileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Geographic bounds of a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    /// Minimum latitude (south edge).
    pub min_lat: f64,
    /// Maximum latitude (north edge).
    pub max_lat: f64,
    /// Minimum longitude (west edge).
    pub min_lon: f64,
    /// Maximum longitude (east edge).
    pub max_lon: f64,
}

impl TileBounds {
    /// Check if a coordinate is within the bounds.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }
}

/// Pixel position inside a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileOffset {
    /// Column, 0..256.
    pub x: u32,
    /// Row, 0..256.
    pub y: u32,
}

impl TileOffset {
    /// Create an offset.
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Tile address plus the pixel within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileInfo {
    /// Tile containing the coordinate.
    pub tile: TileIndex,
    /// Pixel inside the tile.
    pub offset: TileOffset,
}

/// Project a longitude onto the X axis.
///
/// `world = R * λ + 128` with `R = 256 / 2π`, so -180° maps to 0 and 0° to 128.
pub fn longitude_to_x(longitude: f64, zoom: u8) -> AxisPosition {
    let world = PIXELS_PER_RADIAN * longitude.to_radians() + WORLD_CENTER;
    AxisPosition::from_world(world, zoom)
}

/// Project a latitude onto the Y axis.
///
/// `world = -R * ln(tan(π/4 + φ/2)) + 128`. North is up, so larger latitudes
/// give smaller Y values. The log term diverges at the poles.
pub fn latitude_to_y(latitude: f64, zoom: u8) -> AxisPosition {
    let lat_rad = latitude.to_radians();
    let mercator = (PI / 4.0 + lat_rad / 2.0).tan().ln();
    let world = -PIXELS_PER_RADIAN * mercator + WORLD_CENTER;
    AxisPosition::from_world(world, zoom)
}

/// Tile index and intra-tile offset for a coordinate.
///
/// `zoom` must not exceed [`MAX_ZOOM`]. Beyond that the pixel position no
/// longer fits the integer tile index and the result is meaningless; callers
/// taking zoom from outside validate it first, as
/// [`ElevationQuery`](crate::ElevationQuery) and
/// [`QueryConfig::validate`](crate::QueryConfig::validate) do.
pub fn tile_info(latitude: f64, longitude: f64, zoom: u8) -> TileInfo {
    let x = longitude_to_x(longitude, zoom);
    let y = latitude_to_y(latitude, zoom);
    TileInfo {
        tile: TileIndex::new(x.tile, y.tile, zoom),
        offset: TileOffset::new(x.offset, y.offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_antimeridian_is_origin() {
        let x = longitude_to_x(-180.0, 0);
        assert_eq!(x.world, 0.0);
        assert_eq!(x.tile, 0);
        assert_eq!(x.offset, 0);
    }

    #[test]
    fn test_prime_meridian_is_center() {
        let x = longitude_to_x(0.0, 0);
        assert_relative_eq!(x.world, 128.0);
        assert_eq!(x.tile, 0);
        assert_eq!(x.offset, 128);
    }

    #[test]
    fn test_equator_is_center() {
        let y = latitude_to_y(0.0, 0);
        assert_relative_eq!(y.world, 128.0);
        assert_eq!(y.tile, 0);
        assert_eq!(y.offset, 128);
    }

    #[test]
    fn test_zoom_scales_pixels() {
        let x = longitude_to_x(0.0, 1);
        assert_relative_eq!(x.pixel, 256.0);
        assert_eq!(x.tile, 1);
        assert_eq!(x.offset, 0);
    }

    #[test]
    fn test_japan_at_zoom_15() {
        let info = tile_info(35.0, 135.0, 15);
        assert_eq!(info.tile.z, 15);
        assert_eq!(info.tile.x, 28672);
        assert_eq!(info.tile.y, 12979);
        assert_eq!(info.offset.x, 0);
        assert!(info.offset.y < TILE_SIZE);
        assert!(info.tile.is_valid());
    }

    #[test]
    fn test_tile_bounds_contain_coordinate() {
        let test_points = [
            (35.6586, 139.7454),  // Tokyo Tower
            (35.3606, 138.7274),  // Mt. Fuji
            (43.0642, 141.3469),  // Sapporo
            (-33.8688, 151.2093), // Sydney
            (0.0, 0.0),
        ];

        for (lat, lon) in test_points {
            let info = tile_info(lat, lon, 15);
            let bounds = info.tile.bounds();
            assert!(
                bounds.contains(lat, lon),
                "({}, {}) not in {:?} for tile {}",
                lat,
                lon,
                bounds,
                info.tile
            );
        }
    }

    #[test]
    fn test_tile_validity() {
        assert!(TileIndex::new(0, 0, 0).is_valid());
        assert!(!TileIndex::new(1, 0, 0).is_valid());
        assert!(TileIndex::new(32767, 32767, 15).is_valid());
        assert!(!TileIndex::new(32768, 0, 15).is_valid());
        assert!(!TileIndex::new(-1, 0, 15).is_valid());
        assert!(TileIndex::new(0, 0, MAX_ZOOM).is_valid());
    }

    #[test]
    fn test_zoom_beyond_limit_is_never_valid() {
        assert_eq!(TileIndex::new(0, 0, 24).tiles_per_axis(), Some(1 << 24));
        assert_eq!(TileIndex::new(0, 0, 25).tiles_per_axis(), None);
        for z in [25, 63, 64, 70, u8::MAX] {
            assert!(!TileIndex::new(0, 0, z).is_valid(), "zoom {}", z);
        }
    }

    #[test]
    fn test_bounds_at_any_zoom() {
        let bounds = TileIndex::new(0, 0, 70).bounds();
        assert_relative_eq!(bounds.min_lon, -180.0);
        assert!(bounds.max_lon > bounds.min_lon);
        assert!(bounds.max_lat.is_finite());
    }

    #[test]
    fn test_east_edge_is_outside_the_world() {
        let x = longitude_to_x(180.0, 3);
        assert_eq!(x.tile, 8);
        assert_eq!(x.offset, 0);
        assert!(!TileIndex::new(x.tile, 0, 3).is_valid());
        assert!(matches!(
            GeoCoordinate::new(0.0, 180.0),
            Err(DemError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_longitude_is_not_normalized() {
        let x = longitude_to_x(-190.0, 0);
        assert!(x.world < 0.0);
        assert_eq!(x.tile, -1);
        assert!(x.offset < TILE_SIZE);
    }

    #[test]
    fn test_geo_coordinate_validation() {
        assert!(GeoCoordinate::new(35.0, 135.0).is_ok());
        assert!(GeoCoordinate::new(-85.05, -180.0).is_ok());
        assert!(GeoCoordinate::new(0.0, 179.999_999).is_ok());
        assert!(matches!(
            GeoCoordinate::new(85.06, 0.0),
            Err(DemError::InvalidLatitude(_))
        ));
        assert!(matches!(
            GeoCoordinate::new(MAX_LATITUDE, 0.0),
            Err(DemError::InvalidLatitude(_))
        ));
        assert!(matches!(
            GeoCoordinate::new(f64::NAN, 0.0),
            Err(DemError::InvalidLatitude(_))
        ));
        assert!(matches!(
            GeoCoordinate::new(0.0, 180.5),
            Err(DemError::InvalidLongitude(_))
        ));
        assert!(matches!(
            GeoCoordinate::new(0.0, f64::INFINITY),
            Err(DemError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_tile_index_display() {
        assert_eq!(TileIndex::new(28672, 12979, 15).to_string(), "15/28672/12979");
    }

    proptest! {
        #[test]
        fn prop_x_reconstructs_pixel(lon in -180.0f64..180.0, zoom in 0u8..=20) {
            let x = longitude_to_x(lon, zoom);
            prop_assert!(x.offset < TILE_SIZE);
            prop_assert_eq!(
                x.tile * TILE_SIZE as i64 + x.offset as i64,
                x.pixel.floor() as i64
            );
        }

        #[test]
        fn prop_y_reconstructs_pixel(lat in -85.0f64..85.0, zoom in 0u8..=20) {
            let y = latitude_to_y(lat, zoom);
            prop_assert!(y.offset < TILE_SIZE);
            prop_assert_eq!(
                y.tile * TILE_SIZE as i64 + y.offset as i64,
                y.pixel.floor() as i64
            );
        }

        #[test]
        fn prop_north_is_up(lat in -85.0f64..84.9, delta in 0.01f64..0.1, zoom in 0u8..=20) {
            let south = latitude_to_y(lat, zoom);
            let north = latitude_to_y(lat + delta, zoom);
            prop_assert!(north.world < south.world);
            prop_assert!(north.pixel < south.pixel);
            prop_assert!(north.tile <= south.tile);
        }
    }
}
