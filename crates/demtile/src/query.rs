//! Elevation queries: project, fetch, decode.

use crate::config::QueryConfig;
use crate::decode::{DemEncoding, Elevation};
use crate::fetch::{HttpTileSource, ReqwestClient, TileSource, TileUrlTemplate};
use crate::projection::{GeoCoordinate, TileInfo, MAX_ZOOM};
use crate::{DemError, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Resolves elevations by fetching tiles from a [`TileSource`].
///
/// Each query validates its coordinate, projects it, awaits the tile and then
/// decodes a single pixel. The tile is dropped when the query finishes.
///
/// # Example
///
/// ```no_run
/// use demtile::{ElevationQuery, QueryConfig};
///
/// # async fn run() -> demtile::Result<()> {
/// let query = ElevationQuery::from_config(QueryConfig::default())?;
/// let elevation = query.elevation(35.3606, 138.7274).await?; // Mt. Fuji
/// println!("{}", elevation);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ElevationQuery<S: TileSource> {
    /// Where tiles come from.
    source: S,
    /// Zoom used by [`ElevationQuery::elevation`].
    zoom: u8,
    /// Pixel encoding of the dataset.
    encoding: DemEncoding,
}

impl ElevationQuery<HttpTileSource<ReqwestClient>> {
    /// Build a query that downloads tiles over HTTP as configured.
    pub fn from_config(config: QueryConfig) -> Result<Self> {
        config.validate()?;
        let client = ReqwestClient::new(
            Duration::from_secs(config.timeout_secs),
            &config.user_agent,
        )?;
        let source = HttpTileSource::new(
            client,
            TileUrlTemplate::new(&config.url_template)?,
            config.tile_dataset(),
        );
        Self::new(source, config.zoom, config.encoding())
    }
}

impl<S: TileSource> ElevationQuery<S> {
    /// Create a query over `source` at `zoom`.
    pub fn new(source: S, zoom: u8, encoding: DemEncoding) -> Result<Self> {
        if zoom > MAX_ZOOM {
            return Err(DemError::InvalidZoomLevel(zoom));
        }
        Ok(Self {
            source,
            zoom,
            encoding,
        })
    }

    /// The tile source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Zoom level used by default.
    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Tile and pixel that hold the elevation of a coordinate.
    pub fn locate(&self, latitude: f64, longitude: f64) -> Result<TileInfo> {
        Ok(GeoCoordinate::new(latitude, longitude)?.tile_info(self.zoom))
    }

    /// Elevation at a coordinate, at the configured zoom.
    pub async fn elevation(&self, latitude: f64, longitude: f64) -> Result<Elevation> {
        self.elevation_at_zoom(latitude, longitude, self.zoom).await
    }

    /// Elevation at a coordinate, at an explicit zoom.
    pub async fn elevation_at_zoom(
        &self,
        latitude: f64,
        longitude: f64,
        zoom: u8,
    ) -> Result<Elevation> {
        if zoom > MAX_ZOOM {
            return Err(DemError::InvalidZoomLevel(zoom));
        }
        let info = GeoCoordinate::new(latitude, longitude)?.tile_info(zoom);
        debug!(
            latitude,
            longitude,
            tile = %info.tile,
            px = info.offset.x,
            py = info.offset.y,
            "resolved tile"
        );

        let raster = self.source.fetch(info.tile).await?;
        raster.elevation_at(info.offset, &self.encoding)
    }

    /// Elevation at a coordinate, abandoning the fetch if `cancel` fires.
    ///
    /// Returns [`DemError::Cancelled`] without decoding anything when the
    /// token is cancelled before the tile arrives.
    pub async fn elevation_cancellable(
        &self,
        latitude: f64,
        longitude: f64,
        cancel: &CancellationToken,
    ) -> Result<Elevation> {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => Err(DemError::Cancelled),
            result = self.elevation(latitude, longitude) => result,
        }
    }
}

/// Elevation at a coordinate using an HTTP source built from `config`.
pub async fn get_elevation(latitude: f64, longitude: f64, config: &QueryConfig) -> Result<Elevation> {
    ElevationQuery::from_config(config.clone())?
        .elevation(latitude, longitude)
        .await
}
