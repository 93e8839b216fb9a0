//! Great-circle mathematics for proximity search.
//!
//! All functions are pure and operate on validated [`Coordinate`]s.
//!
//! # Conventions
//!
//! - Latitude: degrees north (-90 to 90)
//! - Longitude: degrees east (-180 to 180)
//! - Bearing: degrees true (0-360, 0=north, 90=east)
//! - Distance: kilometres

mod bbox;

pub use bbox::{bounding_box, BoundingBox, BOX_MARGIN, KM_PER_DEGREE_LAT, MIN_COS_LAT};

use std::f64::consts::PI;

use crate::coord::Coordinate;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Degrees to radians conversion factor.
const DEG_TO_RAD: f64 = PI / 180.0;

/// Radians to degrees conversion factor.
const RAD_TO_DEG: f64 = 180.0 / PI;

/// Great-circle distance between two coordinates on a sphere of the given radius.
///
/// Uses the `atan2(sqrt(a), sqrt(1 - a))` form of the haversine formula. The
/// intermediate `a` term is clamped to `[0, 1]` first: rounding can push it a
/// hair past 1.0 for near-antipodal points, which would otherwise produce NaN.
pub fn great_circle_distance_km(a: &Coordinate, b: &Coordinate, radius_km: f64) -> f64 {
    let lat1_rad = a.latitude() * DEG_TO_RAD;
    let lat2_rad = b.latitude() * DEG_TO_RAD;
    let delta_lat = (b.latitude() - a.latitude()) * DEG_TO_RAD;
    let delta_lon = (b.longitude() - a.longitude()) * DEG_TO_RAD;

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    radius_km * c
}

/// Haversine distance in kilometres using the mean Earth radius.
///
/// # Example
///
/// ```
/// use geoprox::coord::validate;
/// use geoprox::geo::haversine_distance_km;
///
/// let sf = validate(37.7749, -122.4194).unwrap();
/// let oakland = validate(37.8044, -122.2712).unwrap();
/// let d = haversine_distance_km(&sf, &oakland);
/// assert!((d - 13.4).abs() < 0.5);
/// ```
#[inline]
pub fn haversine_distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    great_circle_distance_km(a, b, EARTH_RADIUS_KM)
}

/// Initial bearing (forward azimuth) from one coordinate towards another.
///
/// Returns degrees true in `[0, 360)`. The bearing between identical points
/// is reported as 0.
pub fn initial_bearing_deg(from: &Coordinate, to: &Coordinate) -> f64 {
    let lat1_rad = from.latitude() * DEG_TO_RAD;
    let lat2_rad = to.latitude() * DEG_TO_RAD;
    let delta_lon = (to.longitude() - from.longitude()) * DEG_TO_RAD;

    let y = delta_lon.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lon.cos();

    let bearing = (y.atan2(x) * RAD_TO_DEG).rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Formats a distance for display: metres below 1 km, otherwise kilometres
/// with one decimal.
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{} m", (km * 1000.0).round() as u64)
    } else {
        format!("{:.1} km", km)
    }
}
