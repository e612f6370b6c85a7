//! Tile request types.
//!
//! Provides the `TileRequest` type that carries everything needed to fetch
//! one tile from the remote service. The request doubles as the correlation
//! key handed back alongside the fetched bytes, so sinks can name and store
//! the tile without extra bookkeeping.

use crate::coord::TileCoord;

/// Request for one tile from the remote tile service.
///
/// Immutable once created; the orchestrator materializes one request per
/// coordinate in the coverage set. The layer, format extension, and API
/// credential are identical across all requests in a single build run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileRequest {
    coord: TileCoord,
    layer: String,
    format: String,
    api_key: String,
}

impl TileRequest {
    /// Create a new tile request.
    ///
    /// # Arguments
    ///
    /// * `coord` - Tile coordinate to fetch
    /// * `layer` - Vector tile layer name (e.g. `all`)
    /// * `format` - Tile format extension (e.g. `mvt`)
    /// * `api_key` - API credential; may be empty
    pub fn new(
        coord: TileCoord,
        layer: impl Into<String>,
        format: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            coord,
            layer: layer.into(),
            format: format.into(),
            api_key: api_key.into(),
        }
    }

    /// The tile coordinate this request addresses.
    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// The requested layer name.
    pub fn layer(&self) -> &str {
        &self.layer
    }

    /// The tile format extension.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The API credential attached to the request.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}
