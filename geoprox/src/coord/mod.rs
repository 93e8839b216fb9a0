//! Coordinate validation module
//!
//! Validates latitude/longitude pairs coming from callers and from the record
//! store. A position is either fully present and in range, or explicitly
//! absent (`None`); there is no half-set state and no numeric sentinel for
//! "missing".

mod types;

pub use types::{Coordinate, CoordError, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Validates a latitude/longitude pair.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees (-90.0 to 90.0)
/// * `lon` - Longitude in degrees (-180.0 to 180.0)
///
/// # Returns
///
/// The validated coordinate, or an error naming the offending component.
#[inline]
pub fn validate(lat: f64, lon: f64) -> Result<Coordinate, CoordError> {
    Coordinate::new(lat, lon)
}

/// Validates a pair whose components may each be missing.
///
/// Both missing means the position is explicitly absent. A pair with only one
/// component set is treated as absent too: it cannot describe a place, and
/// coercing the missing half to zero would invent one.
pub fn validate_optional(
    lat: Option<f64>,
    lon: Option<f64>,
) -> Result<Option<Coordinate>, CoordError> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => validate(lat, lon).map(Some),
        (None, None) => Ok(None),
        (lat, lon) => {
            tracing::debug!(?lat, ?lon, "Partially set coordinate treated as absent");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests;
