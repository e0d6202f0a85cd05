//! Geometry primitives for spatial queries.
//!
//! Provides the two value types every other layer builds on — [`Point`]
//! and [`BoundingBox`] — plus great-circle distance math.

mod bbox;
mod point;

pub use bbox::BoundingBox;
pub use point::{haversine_distance, Point, EARTH_RADIUS_M, METERS_PER_DEGREE};
