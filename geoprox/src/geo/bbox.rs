//! Conservative lat/lon bounding boxes used as a coarse candidate pre-filter.
//!
//! A box never decides inclusion on its own; the exact haversine distance
//! does. The box only has to be large enough never to lose a candidate.

use crate::coord::{Coordinate, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Kilometres per degree of latitude used for the radius→degrees conversion.
pub const KM_PER_DEGREE_LAT: f64 = 111.32;

/// Below this cosine the longitude extent is unbounded and the box spans
/// every longitude.
pub const MIN_COS_LAT: f64 = 0.01;

/// Widening factor applied to the angular extents.
///
/// Covers the gap between `KM_PER_DEGREE_LAT` and the degree length of the
/// mean-radius sphere (~111.195 km) used for exact distances.
pub const BOX_MARGIN: f64 = 1.01;

/// Axis-aligned latitude/longitude rectangle.
///
/// When `min_lon > max_lon` the box crosses the antimeridian and covers
/// `[min_lon, 180]` plus `[-180, max_lon]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Box covering the whole globe.
    pub const WORLD: BoundingBox = BoundingBox {
        min_lat: MIN_LAT,
        max_lat: MAX_LAT,
        min_lon: MIN_LON,
        max_lon: MAX_LON,
    };

    /// Returns true if the box wraps past ±180° longitude.
    #[inline]
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }

    /// Returns true if the box covers every longitude.
    #[inline]
    pub fn spans_all_longitudes(&self) -> bool {
        self.min_lon <= MIN_LON && self.max_lon >= MAX_LON
    }

    /// Longitude ranges covered by the box: one range normally, two when the
    /// box crosses the antimeridian.
    pub fn lon_ranges(&self) -> Vec<(f64, f64)> {
        if self.crosses_antimeridian() {
            vec![(self.min_lon, MAX_LON), (MIN_LON, self.max_lon)]
        } else {
            vec![(self.min_lon, self.max_lon)]
        }
    }

    /// Returns true if the coordinate lies inside the box (edges included).
    pub fn contains(&self, coord: &Coordinate) -> bool {
        let lat = coord.latitude();
        if lat < self.min_lat || lat > self.max_lat {
            return false;
        }
        self.lon_ranges()
            .iter()
            .any(|&(lo, hi)| (lo..=hi).contains(&coord.longitude()))
    }
}

/// Computes a conservative bounding box around `origin` for `radius_km`.
///
/// Latitude extent is `radius_km / 111.32` degrees. Longitude extent is the
/// same divided by the cosine of the box's most poleward latitude, because
/// meridians converge and a circle is widest in degrees on its poleward side.
/// If the box reaches a pole, or the cosine falls under [`MIN_COS_LAT`], or
/// the longitude extent reaches 180°, the box spans all longitudes.
pub fn bounding_box(origin: &Coordinate, radius_km: f64) -> BoundingBox {
    let lat = origin.latitude();
    let lon = origin.longitude();
    let lat_delta = radius_km / KM_PER_DEGREE_LAT * BOX_MARGIN;

    let min_lat = lat - lat_delta;
    let max_lat = lat + lat_delta;

    if min_lat <= MIN_LAT || max_lat >= MAX_LAT {
        return BoundingBox {
            min_lat: min_lat.max(MIN_LAT),
            max_lat: max_lat.min(MAX_LAT),
            min_lon: MIN_LON,
            max_lon: MAX_LON,
        };
    }

    let poleward_lat = min_lat.abs().max(max_lat.abs());
    let cos_lat = poleward_lat.to_radians().cos();
    let lon_delta = if cos_lat < MIN_COS_LAT {
        f64::INFINITY
    } else {
        lat_delta / cos_lat
    };

    if lon_delta >= 180.0 {
        return BoundingBox {
            min_lat,
            max_lat,
            min_lon: MIN_LON,
            max_lon: MAX_LON,
        };
    }

    let mut min_lon = lon - lon_delta;
    let mut max_lon = lon + lon_delta;
    if min_lon < MIN_LON {
        min_lon += 360.0;
    }
    if max_lon > MAX_LON {
        max_lon -= 360.0;
    }

    BoundingBox {
        min_lat,
        max_lat,
        min_lon,
        max_lon,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::validate;
    use crate::geo::haversine_distance_km;

    fn c(lat: f64, lon: f64) -> Coordinate {
        validate(lat, lon).unwrap()
    }

    #[test]
    fn test_box_contains_origin() {
        let origin = c(37.7749, -122.4194);
        let bbox = bounding_box(&origin, 20.0);
        assert!(bbox.contains(&origin));
        assert!(!bbox.crosses_antimeridian());
        assert_eq!(bbox.lon_ranges().len(), 1);
    }

    #[test]
    fn test_latitude_extent() {
        let bbox = bounding_box(&c(0.0, 0.0), KM_PER_DEGREE_LAT);
        assert!((bbox.max_lat - BOX_MARGIN).abs() < 1e-9);
        assert!((bbox.min_lat + BOX_MARGIN).abs() < 1e-9);
    }

    #[test]
    fn test_longitude_extent_widens_with_latitude() {
        let equator = bounding_box(&c(0.0, 0.0), 100.0);
        let north = bounding_box(&c(60.0, 0.0), 100.0);
        let eq_width = equator.max_lon - equator.min_lon;
        let north_width = north.max_lon - north.min_lon;
        assert!(north_width > eq_width * 1.9, "{} vs {}", north_width, eq_width);
    }

    #[test]
    fn test_antimeridian_split() {
        let bbox = bounding_box(&c(0.0, 179.9), 30.0);
        assert!(bbox.crosses_antimeridian());

        let ranges = bbox.lon_ranges();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].1, 180.0);
        assert_eq!(ranges[1].0, -180.0);
        assert!(bbox.contains(&c(0.0, -179.9)));
        assert!(bbox.contains(&c(0.0, 179.95)));
        assert!(!bbox.contains(&c(0.0, 0.0)));
    }

    #[test]
    fn test_antimeridian_split_from_west_side() {
        let bbox = bounding_box(&c(10.0, -179.95), 20.0);
        assert!(bbox.crosses_antimeridian());
        assert!(bbox.contains(&c(10.0, 179.95)));
    }

    #[test]
    fn test_polar_box_spans_all_longitudes() {
        let bbox = bounding_box(&c(89.9, 45.0), 50.0);
        assert!(bbox.spans_all_longitudes());
        assert_eq!(bbox.max_lat, 90.0);
        assert!(bbox.contains(&c(89.95, -135.0)));
    }

    #[test]
    fn test_huge_radius_spans_world() {
        let bbox = bounding_box(&c(10.0, 10.0), 25_000.0);
        assert_eq!(bbox, BoundingBox::WORLD);
    }

    #[test]
    fn test_box_never_excludes_points_inside_radius() {
        // Walk a ring of points just inside the radius at several latitudes
        for &lat in &[-80.0, -45.0, 0.0, 30.0, 65.0, 85.0] {
            let origin = c(lat, 179.0);
            let radius = 150.0;
            let bbox = bounding_box(&origin, radius);

            for step in 0..72 {
                for dlat in [-1.5, -0.7, 0.0, 0.7, 1.5] {
                    let lon_off = (step as f64 - 36.0) * 0.25;
                    let p_lat = (lat + dlat).clamp(-90.0, 90.0);
                    let mut p_lon = 179.0 + lon_off;
                    if p_lon > 180.0 {
                        p_lon -= 360.0;
                    }
                    let p = c(p_lat, p_lon);
                    if haversine_distance_km(&origin, &p) <= radius {
                        assert!(bbox.contains(&p), "lost {:?} around {:?}", p, origin);
                    }
                }
            }
        }
    }
}
