//! Tilepack - offline map tile package builder
//!
//! Fetches every map tile covering a geographic bounding box across a range
//! of zoom levels from a remote tile service and streams the results into
//! one or more portable package formats (an MBTiles SQLite container and a
//! gzip'd tar archive ship built in).
//!
//! The pipeline is composed from small parts:
//! - [`coord`] converts geographic coordinates to tile indices and
//!   enumerates the coverage of a bounding box
//! - [`fetch`] downloads single tiles with backoff-and-jitter retry
//! - [`sink`] holds the package writers behind a common trait and the
//!   registry resolving output format names
//! - [`builder`] drives a bounded worker pool over the full request set and
//!   fans every tile out to all active sinks
//!
//! # Example
//!
//! ```no_run
//! use tilepack::{
//!     BuildConfig, GeoBoundingBox, PackageBuilder, ReqwestClient, SinkRegistry, TileFetcher,
//!     ZoomRange,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = TileFetcher::new(ReqwestClient::new()?);
//! let builder = PackageBuilder::new(fetcher, SinkRegistry::default());
//!
//! let summary = builder.build(&BuildConfig {
//!     bbox: GeoBoundingBox::new(-0.1, 51.5, 0.1, 51.6),
//!     zoom_range: ZoomRange::new(0, 10),
//!     layer: "all".to_string(),
//!     tile_format: "mvt".to_string(),
//!     output_basename: "london".to_string(),
//!     output_formats: vec!["mbtiles".to_string(), "archive".to_string()],
//!     api_key: String::new(),
//! })?;
//! println!("{} tiles in {} packages", summary.tile_count, summary.package_count);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod coord;
pub mod fetch;
pub mod logging;
pub mod sink;
pub mod tile;

pub use builder::{BuildConfig, BuildError, BuildSummary, PackageBuilder};
pub use coord::{
    cover_bounding_box, point_to_tile, tile_to_lon_lat, GeoBoundingBox, TileCoord, ZoomRange,
};
pub use fetch::{FetchError, HttpClient, ReqwestClient, RetryPolicy, TileFetcher};
pub use sink::{ArchiveSink, MbtilesSink, SinkError, SinkRegistry, TileSink};
pub use tile::TileRequest;
