//! Tile retrieval.
//!
//! The pipeline only needs something that turns a [`TileIndex`] into a
//! [`RasterTile`]; that contract is the [`TileSource`] trait. The bundled
//! implementation, [`HttpTileSource`], downloads PNG tiles from an XYZ tile
//! server and decodes them with the `image` crate.
//!
//! Source: `https://cyberjapandata.gsi.go.jp/xyz/{dataset}/{z}/{x}/{y}.{ext}`
//!
//! ## Datasets
//!
//! | id | native zoom | coverage |
//! |---|---|---|
//! | `dem5a_png` | 15 | 5 m laser survey, partial |
//! | `dem5b_png` | 15 | 5 m photogrammetry, partial |
//! | `dem_png` | 14 | 10 m, all of Japan |
//!
//! Sparse datasets return HTTP 404 for tiles they do not cover; that surfaces
//! as [`DemError::TileUnavailable`].

use crate::projection::{TileIndex, MAX_ZOOM};
use crate::tile::RasterTile;
use crate::{DemError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// GSI tile server URL template.
pub const DEFAULT_URL_TEMPLATE: &str =
    "https://cyberjapandata.gsi.go.jp/xyz/{dataset}/{z}/{x}/{y}.{ext}";

/// Default dataset identifier.
pub const DEFAULT_DATASET: &str = "dem5a_png";

/// Default tile file extension.
pub const DEFAULT_EXTENSION: &str = "png";

/// Known datasets and the zoom level they are published at.
const KNOWN_DATASETS: &[(&str, u8)] = &[("dem5a_png", 15), ("dem5b_png", 15), ("dem_png", 14)];

/// A raster dataset on the tile server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileDataset {
    /// Dataset identifier, e.g. `dem5a_png`.
    pub id: String,
    /// File extension without the dot.
    pub extension: String,
}

impl Default for TileDataset {
    fn default() -> Self {
        Self::new(DEFAULT_DATASET, DEFAULT_EXTENSION)
    }
}

impl TileDataset {
    /// Create a dataset descriptor.
    pub fn new(id: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extension: extension.into(),
        }
    }

    /// Dataset with the default `png` extension.
    pub fn png(id: impl Into<String>) -> Self {
        Self::new(id, DEFAULT_EXTENSION)
    }

    /// Zoom level the dataset is published at, if it is a known dataset.
    pub fn native_zoom(&self) -> Option<u8> {
        KNOWN_DATASETS
            .iter()
            .find(|(id, _)| *id == self.id)
            .map(|(_, z)| *z)
    }
}

/// URL template for tile requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileUrlTemplate {
    template: String,
}

impl Default for TileUrlTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_URL_TEMPLATE.to_string(),
        }
    }
}

impl TileUrlTemplate {
    /// Create a template. It must contain `{z}`, `{x}` and `{y}`.
    pub fn new(template: &str) -> Result<Self> {
        for placeholder in ["{z}", "{x}", "{y}"] {
            if !template.contains(placeholder) {
                return Err(DemError::Config(format!(
                    "URL template {:?} is missing {}",
                    template, placeholder
                )));
            }
        }
        Ok(Self {
            template: template.to_string(),
        })
    }

    /// Build the URL for a tile of a dataset.
    pub fn render(&self, tile: &TileIndex, dataset: &TileDataset) -> String {
        self.template
            .replace("{dataset}", &dataset.id)
            .replace("{z}", &tile.z.to_string())
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{ext}", &dataset.extension)
    }
}

/// Something that can produce the raster for a tile.
///
/// `fetch` is the only suspending step of an elevation query. The returned
/// raster must be complete; failures are reported as
/// [`DemError::TileUnavailable`].
pub trait TileSource: Send + Sync {
    /// Retrieve and decode the tile.
    fn fetch(&self, tile: TileIndex) -> impl Future<Output = Result<RasterTile>> + Send;
}

/// Failure of a single HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Server answered with a non-success status.
    #[error("HTTP {0}")]
    Status(u16),
    /// Request could not be completed.
    #[error("request failed: {0}")]
    Transport(String),
}

/// Asynchronous HTTP GET, abstracted for testing.
pub trait AsyncHttpClient: Send + Sync {
    /// Fetch the body at `url`.
    fn get(&self, url: &str) -> impl Future<Output = std::result::Result<Vec<u8>, FetchError>> + Send;
}

/// HTTP client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client with a request timeout and user agent.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

/// Download statistics for an HTTP tile source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Number of tiles downloaded.
    pub tiles_downloaded: usize,
    /// Total bytes downloaded.
    pub bytes_downloaded: u64,
}

/// Tile source that downloads and decodes raster tiles over HTTP.
pub struct HttpTileSource<C: AsyncHttpClient> {
    /// HTTP client used for requests.
    client: C,
    /// URL template.
    template: TileUrlTemplate,
    /// Dataset to request.
    dataset: TileDataset,
    /// Number of tiles downloaded (atomic for shared use).
    tiles_downloaded: AtomicUsize,
    /// Total bytes downloaded.
    bytes_downloaded: AtomicU64,
}

impl<C: AsyncHttpClient> std::fmt::Debug for HttpTileSource<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTileSource")
            .field("template", &self.template)
            .field("dataset", &self.dataset)
            .finish()
    }
}

impl<C: AsyncHttpClient> HttpTileSource<C> {
    /// Create a source for `dataset` using `template`.
    pub fn new(client: C, template: TileUrlTemplate, dataset: TileDataset) -> Self {
        Self {
            client,
            template,
            dataset,
            tiles_downloaded: AtomicUsize::new(0),
            bytes_downloaded: AtomicU64::new(0),
        }
    }

    /// HTTP client used for requests.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Dataset this source requests.
    pub fn dataset(&self) -> &TileDataset {
        &self.dataset
    }

    /// URL of a tile.
    pub fn tile_url(&self, tile: &TileIndex) -> String {
        self.template.render(tile, &self.dataset)
    }

    /// Get download statistics.
    pub fn download_stats(&self) -> DownloadStats {
        DownloadStats {
            tiles_downloaded: self.tiles_downloaded.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }

    /// Reset download statistics.
    pub fn reset_download_stats(&self) {
        self.tiles_downloaded.store(0, Ordering::Relaxed);
        self.bytes_downloaded.store(0, Ordering::Relaxed);
    }
}

fn unavailable(tile: &TileIndex, reason: impl Into<String>) -> DemError {
    DemError::TileUnavailable {
        z: tile.z,
        x: tile.x,
        y: tile.y,
        reason: reason.into(),
    }
}

/// Decode an encoded image into a raster tile.
pub fn decode_tile_image(tile: TileIndex, bytes: &[u8]) -> Result<RasterTile> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| unavailable(&tile, format!("decode: {}", e)))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    RasterTile::from_rgba(tile, width, height, rgba.into_raw())
        .map_err(|e| unavailable(&tile, e.to_string()))
}

impl<C: AsyncHttpClient> TileSource for HttpTileSource<C> {
    async fn fetch(&self, tile: TileIndex) -> Result<RasterTile> {
        if tile.z > MAX_ZOOM {
            return Err(DemError::InvalidZoomLevel(tile.z));
        }
        if !tile.is_valid() {
            return Err(unavailable(&tile, "tile index outside the world"));
        }

        let url = self.tile_url(&tile);
        debug!(%tile, %url, "fetching tile");

        let bytes = self.client.get(&url).await.map_err(|e| {
            warn!(%tile, %url, error = %e, "tile download failed");
            unavailable(&tile, e.to_string())
        })?;

        self.tiles_downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);

        decode_tile_image(tile, &bytes).inspect_err(|e| {
            warn!(%tile, error = %e, "tile image rejected");
        })
    }
}
