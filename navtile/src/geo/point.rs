//! Geographic point and great-circle distance.

use std::fmt;

/// Mean Earth radius in meters, used for great-circle distance.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Approximate meters per degree of latitude, used to convert a search
/// radius in meters into a degree offset for bounding-box construction.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Latitude in degrees (positive north).
    pub lat: f64,
    /// Longitude in degrees (positive east).
    pub lon: f64,
}

impl Point {
    /// Create a new point from latitude and longitude in degrees.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to another point, in meters.
    pub fn distance_to(&self, other: &Point) -> f64 {
        haversine_distance(self, other)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Great-circle distance between two points using the haversine formula.
///
/// # Returns
///
/// Distance in meters. Always non-negative.
pub fn haversine_distance(a: &Point, b: &Point) -> f64 {
    let lat_a = a.lat.to_radians();
    let lat_b = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let p = Point::new(21.0, 105.8);
        assert_eq!(p.lat, 21.0);
        assert_eq!(p.lon, 105.8);
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = Point::new(21.0, 105.8);
        assert_eq!(p.distance_to(&p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Point::new(21.0, 105.8);
        let b = Point::new(21.001, 105.801);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-9);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // One degree of latitude is roughly 111 km everywhere.
        let a = Point::new(21.0, 105.8);
        let b = Point::new(22.0, 105.8);
        let d = a.distance_to(&b);
        assert!((d - 111_000.0).abs() < 500.0, "got {}", d);
    }

    #[test]
    fn test_distance_small_offset() {
        // 0.001 degrees of latitude is roughly 111 m.
        let a = Point::new(21.0, 105.8);
        let b = Point::new(21.001, 105.8);
        let d = a.distance_to(&b);
        assert!((d - 111.0).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_display() {
        let p = Point::new(21.0, 105.8);
        assert_eq!(format!("{}", p), "(21.000000, 105.800000)");
    }
}
