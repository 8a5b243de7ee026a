//! Utility functions for Web Mercator projection

use crate::TrackPoint;
use geo::Point;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;
pub const EARTH_MERCATOR_MIN: f64 = -20037508.34;
pub const EARTH_SIZE_METERS: f64 = EARTH_MERCATOR_MAX - EARTH_MERCATOR_MIN;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_LATITUDE: f64 = 85.05112878;

/// Precomputed constant: EARTH_MERCATOR_MAX / 180.0
const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;

/// Precomputed constant: EARTH_MERCATOR_MAX / PI
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / std::f64::consts::PI;

/// Precomputed constant: 180.0 / EARTH_MERCATOR_MAX
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;

/// Precomputed constant: PI / EARTH_MERCATOR_MAX
const Y_TO_LAT_FACTOR: f64 = std::f64::consts::PI / EARTH_MERCATOR_MAX;

/// Convert WGS84 (lat, lon) to Web Mercator (x, y) in meters
///
/// Latitude is clamped to ±[`MAX_LATITUDE`] so the poles stay finite.
#[inline(always)]
pub fn wgs84_to_mercator(lat: f64, lon: f64) -> Point<f64> {
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);

    let x = lon * LON_TO_X_FACTOR;
    let lat_rad = lat.to_radians();
    let y = (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR;

    Point::new(x, y)
}

/// Convert Web Mercator (x, y) in meters back to a WGS84 track point
#[inline(always)]
pub fn mercator_to_wgs84(x: f64, y: f64) -> TrackPoint {
    let lon = x * X_TO_LON_FACTOR;
    let lat =
        (std::f64::consts::PI / 2.0 - 2.0 * ((-y * Y_TO_LAT_FACTOR).exp()).atan()).to_degrees();
    TrackPoint::new(lat, lon)
}

/// Project a track point to Web Mercator
#[inline(always)]
pub fn track_point_to_mercator(point: &TrackPoint) -> Point<f64> {
    wgs84_to_mercator(point.latitude, point.longitude)
}
