//! Spatial query utilities for distance calculations.
//!
//! Uses the Haversine formula on a spherical Earth.

use geo::Point;

/// Spherical Earth radius used for all stop distances
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate Haversine distance between two points in meters
///
/// Points follow the `geo` convention: x = longitude, y = latitude.
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    let phi1 = p1.y().to_radians();
    let phi2 = p2.y().to_radians();
    let d_phi = (p2.y() - p1.y()).to_radians();
    let d_lambda = (p2.x() - p1.x()).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    EARTH_RADIUS_M * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}
