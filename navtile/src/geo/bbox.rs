//! Axis-aligned lat/lon rectangle.

use super::point::{Point, METERS_PER_DEGREE};
use std::fmt;

/// An axis-aligned latitude/longitude rectangle.
///
/// Invariants: `min_lat <= max_lat` and `min_lon <= max_lon`.
/// Containment is inclusive on all four edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// South edge in degrees.
    pub min_lat: f64,
    /// West edge in degrees.
    pub min_lon: f64,
    /// North edge in degrees.
    pub max_lat: f64,
    /// East edge in degrees.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a new bounding box from its corner coordinates.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Build a square search box centered on a point.
    ///
    /// The radius in meters is converted to an approximate degree offset
    /// (meters / 111,000). Good enough for a local nearest-node search;
    /// not intended for polar or antimeridian-crossing regions.
    pub fn around(center: &Point, radius_m: f64) -> Self {
        let delta = radius_m / METERS_PER_DEGREE;
        Self {
            min_lat: center.lat - delta,
            min_lon: center.lon - delta,
            max_lat: center.lat + delta,
            max_lon: center.lon + delta,
        }
    }

    /// Whether the point lies inside the box, inclusive on all edges.
    pub fn contains(&self, p: &Point) -> bool {
        p.lat >= self.min_lat && p.lat <= self.max_lat && p.lon >= self.min_lon && p.lon <= self.max_lon
    }

    /// Whether two boxes overlap.
    ///
    /// True iff neither the latitude nor the longitude ranges are strictly
    /// disjoint, so boxes that merely share an edge still intersect.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(other.min_lat > self.max_lat
            || other.max_lat < self.min_lat
            || other.min_lon > self.max_lon
            || other.max_lon < self.min_lon)
    }

    /// Center point of the box.
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6},{:.6}]-[{:.6},{:.6}]",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> BoundingBox {
        BoundingBox::new(21.0, 105.8, 21.001, 105.801)
    }

    #[test]
    fn test_contains_interior_point() {
        let b = unit_box();
        assert!(b.contains(&Point::new(21.0005, 105.8005)));
    }

    #[test]
    fn test_contains_is_inclusive_on_edges() {
        let b = unit_box();
        assert!(b.contains(&Point::new(21.0, 105.8)));
        assert!(b.contains(&Point::new(21.001, 105.801)));
        assert!(b.contains(&Point::new(21.0, 105.801)));
        assert!(b.contains(&Point::new(21.001, 105.8)));
    }

    #[test]
    fn test_contains_rejects_outside_point() {
        let b = unit_box();
        assert!(!b.contains(&Point::new(21.002, 105.8005)));
        assert!(!b.contains(&Point::new(21.0005, 105.799)));
    }

    #[test]
    fn test_intersects_overlapping() {
        let a = unit_box();
        let b = BoundingBox::new(21.0005, 105.8005, 21.002, 105.802);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_intersects_shared_edge() {
        let a = unit_box();
        let b = BoundingBox::new(21.001, 105.8, 21.002, 105.801);
        assert!(a.intersects(&b), "boxes sharing an edge must intersect");
    }

    #[test]
    fn test_intersects_disjoint() {
        let a = unit_box();
        let b = BoundingBox::new(22.0, 106.8, 22.001, 106.801);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
    }

    #[test]
    fn test_intersects_self() {
        let a = unit_box();
        assert!(a.intersects(&a));
    }

    #[test]
    fn test_around_builds_centered_box() {
        let center = Point::new(21.0, 105.8);
        let b = BoundingBox::around(&center, 111.0);
        // 111 m is ~0.001 degrees.
        assert!((b.min_lat - 20.999).abs() < 1e-9);
        assert!((b.max_lat - 21.001).abs() < 1e-9);
        assert!(b.contains(&center));
    }

    #[test]
    fn test_center() {
        let b = unit_box();
        let c = b.center();
        assert!((c.lat - 21.0005).abs() < 1e-9);
        assert!((c.lon - 105.8005).abs() < 1e-9);
    }
}
