//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (longitude/latitude)
//! and Web Mercator tile coordinates, plus enumeration of the tile set
//! covering a bounding box at a given zoom level.

mod types;

pub use types::{
    CoverageIter, GeoBoundingBox, TileCoord, ZoomRange, MAX_LON, MAX_MERCATOR_LAT, MAX_ZOOM,
    MIN_LON,
};

use std::f64::consts::PI;

/// Converts geographic coordinates to tile coordinates.
///
/// Longitude maps linearly onto columns; latitude maps onto rows via the
/// spherical Web Mercator projection (`ln(tan(π/4 + lat/2))`). Both indices
/// are clamped to `[0, 2^zoom - 1]`, so out-of-range inputs (including the
/// poles, where the projection diverges) fold onto the edge tiles instead
/// of panicking.
///
/// Pure and deterministic: the same `(lon, lat, zoom)` always yields the
/// same tile.
#[inline]
pub fn point_to_tile(lon: f64, lat: f64, zoom: u8) -> TileCoord {
    let n = 2.0_f64.powi(zoom as i32);
    let max_index = n - 1.0;

    let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, max_index) as u32;

    // Clamp latitude into the projection's domain before tan/ln blow up.
    let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let mercator_y = (PI / 4.0 + lat_rad / 2.0).tan().ln();
    let fraction = (1.0 - mercator_y / PI) / 2.0;
    let y = (fraction * n).floor().clamp(0.0, max_index) as u32;

    TileCoord { x, y, zoom }
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the longitude/latitude of the tile's north-west corner.
#[inline]
pub fn tile_to_lon_lat(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lon, lat)
}

/// Enumerates the tiles covering a bounding box at one zoom level.
///
/// The north-west corner `(min_lon, max_lat)` yields the minimum column and
/// row; the south-east corner `(max_lon, min_lat)` yields the maxima (tile
/// rows grow southward, so the north edge is the *smaller* row index). The
/// returned iterator yields the full inclusive rectangle in deterministic
/// row-major order.
pub fn cover_bounding_box(bbox: &GeoBoundingBox, zoom: u8) -> CoverageIter {
    let north_west = point_to_tile(bbox.min_lon, bbox.max_lat, zoom);
    let south_east = point_to_tile(bbox.max_lon, bbox.min_lat, zoom);

    CoverageIter::new(
        zoom,
        north_west.x,
        north_west.y,
        south_east.x,
        south_east.y,
    )
}
