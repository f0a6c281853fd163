//! Single decoded raster tile.

use crate::decode::{decode_elevation, DemEncoding, Elevation};
use crate::projection::{TileIndex, TileOffset, TILE_SIZE};
use crate::{DemError, Result};

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Length in bytes of a full 256x256 RGBA tile.
pub const TILE_BYTES: usize = TILE_SIZE as usize * TILE_SIZE as usize * BYTES_PER_PIXEL;

/// A fully materialized 256x256 RGBA tile.
///
/// Pixels are stored row-major from the top-left corner, four bytes each.
/// A `RasterTile` only exists once its whole buffer has been decoded, so
/// reading from it never observes a partial load.
#[derive(Clone)]
pub struct RasterTile {
    /// Tile this raster was fetched for.
    index: TileIndex,
    /// RGBA pixel data.
    data: Vec<u8>,
}

impl std::fmt::Debug for RasterTile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterTile")
            .field("index", &self.index)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl RasterTile {
    /// Wrap an RGBA buffer, checking that it is exactly one tile.
    pub fn from_rgba(index: TileIndex, width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width != TILE_SIZE || height != TILE_SIZE || data.len() != TILE_BYTES {
            return Err(DemError::InvalidRaster {
                width,
                height,
                len: data.len(),
            });
        }
        Ok(Self { index, data })
    }

    /// Tile this raster covers.
    pub fn index(&self) -> TileIndex {
        self.index
    }

    /// Raw RGBA bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// RGBA value of the pixel at `offset`.
    pub fn pixel(&self, offset: TileOffset) -> Result<[u8; 4]> {
        let idx = pixel_index(offset)?;
        let p = &self.data[idx..idx + BYTES_PER_PIXEL];
        Ok([p[0], p[1], p[2], p[3]])
    }

    /// Decode the elevation stored at `offset`.
    pub fn elevation_at(&self, offset: TileOffset, encoding: &DemEncoding) -> Result<Elevation> {
        decode_elevation(&self.data, offset, encoding)
    }
}

/// Byte index of the first channel of the pixel at `offset`.
pub(crate) fn pixel_index(offset: TileOffset) -> Result<usize> {
    if offset.x >= TILE_SIZE || offset.y >= TILE_SIZE {
        return Err(DemError::OffsetOutOfRange {
            x: offset.x,
            y: offset.y,
        });
    }
    Ok(offset.y as usize * TILE_SIZE as usize * BYTES_PER_PIXEL
        + offset.x as usize * BYTES_PER_PIXEL)
}
