//! Nearest-stop resolution.
//!
//! Two-stage filtering:
//! 1. **Quadtree filter**: a small box around the query point shortlists candidates
//! 2. **Haversine pick**: the candidate with the smallest great-circle distance wins
//!
//! When the box yields nothing, when its best hit is farther than the box can
//! vouch for, or when part of the box lies where unindexed stops may sit, every
//! stop is scanned instead. The answer is therefore always the same as an
//! exhaustive scan, and a stop is returned whenever one exists.

use std::sync::Arc;

use geo::Point;

use crate::models::types::{NearestStop, Stop};
use crate::spatial::quadtree::{QuadTree, Rectangle};
use crate::spatial::queries::{haversine_distance, EARTH_RADIUS_M};

/// Resolve the stop closest to `point` (x = longitude, y = latitude).
///
/// `tree` holds indices into `stops`; pass `None` when no index has been built
/// yet. Pure with respect to its inputs. Returns `None` if `stops` is empty or
/// `point` has a non-finite coordinate.
pub fn resolve_nearest(
    point: Point,
    tree: Option<&QuadTree<usize>>,
    stops: &[Arc<Stop>],
    margin_deg: f64,
) -> Option<NearestStop> {
    if !point.x().is_finite() || !point.y().is_finite() {
        tracing::debug!(?point, "non-finite query point");
        return None;
    }

    if let Some(tree) = tree {
        let range = Rectangle::around(point.y(), point.x(), margin_deg);
        let candidates: Vec<usize> = tree.query(&range).into_iter().copied().collect();

        // Stops outside the tree boundary are never indexed, so the box only
        // vouches for its hits when it cannot reach any of them.
        let complete = tree.len() == stops.len() || tree.boundary().contains_rect(&range);

        if let Some(best) = closest_of(point, candidates, stops) {
            if complete && best.distance_m <= covered_radius(point, margin_deg) {
                return Some(best);
            }
            tracing::debug!(
                distance_m = best.distance_m,
                complete,
                "nearest candidate not guaranteed, scanning all stops"
            );
        } else {
            tracing::debug!("no stops in search box, scanning all stops");
        }
    }

    closest_of(point, 0..stops.len(), stops)
}

/// Minimum-distance stop among `candidates`; first encountered wins ties.
fn closest_of(
    point: Point,
    candidates: impl IntoIterator<Item = usize>,
    stops: &[Arc<Stop>],
) -> Option<NearestStop> {
    let mut nearest: Option<NearestStop> = None;

    for stop in candidates.into_iter().filter_map(|i| stops.get(i)) {
        let distance_m = haversine_distance(point, stop.location());
        if nearest.as_ref().map_or(true, |n| distance_m < n.distance_m) {
            nearest = Some(NearestStop {
                stop: Arc::clone(stop),
                distance_m,
            });
        }
    }

    nearest
}

/// Radius in meters of the largest circle around `point` that the search box
/// is guaranteed to contain.
///
/// A stop within this radius is certainly a candidate, so a candidate at or
/// below it cannot be beaten by anything outside the box.
fn covered_radius(point: Point, margin_deg: f64) -> f64 {
    let widest_lat = (point.y().abs() + margin_deg).min(90.0);
    let meters_per_deg = EARTH_RADIUS_M * 1f64.to_radians();
    // Shrunk slightly to absorb the flat-box approximation
    0.99 * margin_deg * meters_per_deg * widest_lat.to_radians().cos()
}
