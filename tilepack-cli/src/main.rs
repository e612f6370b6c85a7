//! Tilepack CLI - Command-line interface
//!
//! Builds offline map tile packages from the command line. The credential
//! for the tile service is read from the `MAPZEN_API_KEY` environment
//! variable; when it is unset the request is sent with an empty key.

use clap::Parser;
use std::process;
use tracing::info;

use tilepack::coord::MAX_ZOOM;
use tilepack::logging::{init_logging, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE};
use tilepack::{
    BuildConfig, GeoBoundingBox, PackageBuilder, ReqwestClient, SinkRegistry, TileFetcher,
    ZoomRange,
};

/// Environment variable holding the tile service API key.
const API_KEY_ENV: &str = "MAPZEN_API_KEY";

#[derive(Parser)]
#[command(name = "tilepack")]
#[command(about = "Build offline map tile packages for a bounding box", long_about = None)]
struct Args {
    /// Bounding box minimum longitude (left edge)
    min_lon: f64,

    /// Bounding box minimum latitude (bottom edge)
    min_lat: f64,

    /// Bounding box maximum longitude (right edge)
    max_lon: f64,

    /// Bounding box maximum latitude (top edge)
    max_lat: f64,

    /// The minimum zoom level to include
    min_zoom: u8,

    /// The maximum zoom level to include
    max_zoom: u8,

    /// The base filename for the output tile packages
    output: String,

    /// The vector tile layer to request
    #[arg(long, default_value = "all")]
    layer: String,

    /// The tile format to request
    #[arg(long, default_value = "mvt")]
    tile_format: String,

    /// A comma-separated list of output formats to write to
    #[arg(long, default_value = "mbtiles,archive")]
    output_formats: String,
}

fn main() {
    let args = Args::parse();

    let _logging_guard = match init_logging(DEFAULT_LOG_DIR, DEFAULT_LOG_FILE) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    let bbox = GeoBoundingBox::new(args.min_lon, args.min_lat, args.max_lon, args.max_lat);
    if !bbox.is_valid() {
        eprintln!("Error: bounding box must satisfy min_lon < max_lon and min_lat < max_lat");
        process::exit(1);
    }

    if args.min_zoom > args.max_zoom {
        eprintln!("Error: min_zoom must not exceed max_zoom");
        process::exit(1);
    }
    if args.max_zoom > MAX_ZOOM {
        eprintln!("Error: zoom levels beyond {} are not supported", MAX_ZOOM);
        process::exit(1);
    }

    // A missing key is passed through as empty; the service decides what an
    // unauthenticated request is worth.
    let api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
    if api_key.is_empty() {
        info!("{} is not set, requesting tiles without a credential", API_KEY_ENV);
    }

    let client = match ReqwestClient::new() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let builder = PackageBuilder::new(TileFetcher::new(client), SinkRegistry::default());

    let config = BuildConfig {
        bbox,
        zoom_range: ZoomRange::new(args.min_zoom, args.max_zoom),
        layer: args.layer,
        tile_format: args.tile_format,
        output_basename: args.output,
        output_formats: args
            .output_formats
            .split(',')
            .map(|format| format.trim().to_string())
            .filter(|format| !format.is_empty())
            .collect(),
        api_key,
    };

    match builder.build(&config) {
        Ok(summary) => {
            println!(
                "Wrote {} package(s) covering {} tile(s)",
                summary.package_count, summary.tile_count
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
