//! Core traits for stop data.
//!
//! These traits define the public interface the map layer consumes.
//! Implementations can be in-memory, database-backed, or remote.

use std::sync::Arc;

use geo::Point;

use crate::identifiers::*;
use crate::models::types::*;
use crate::spatial::Rectangle;

/// Provider of one generation of stop data with lookup and query methods
pub trait StopProvider: Send + Sync {
    // ---- Lookups ----
    fn get_stop(&self, id: &StopIdentifier) -> Option<Arc<Stop>>;

    // ---- Collections ----

    /// All stops in route (`seq`) order
    fn all_stops(&self) -> &[Arc<Stop>];

    /// Stops whose name contains `term`, ignoring case
    fn search_stops(&self, term: &str) -> Vec<Arc<Stop>>;

    // ---- Spatial queries ----

    /// Stops inside an axis-aligned range (x = latitude, y = longitude)
    fn stops_within(&self, range: &Rectangle) -> Vec<Arc<Stop>>;

    /// Closest stop to a point, `None` when no stops are loaded
    fn nearest_stop(&self, point: Point) -> Option<NearestStop>;

    // ---- Route queries ----

    /// Minimum-distance path between two stops.
    ///
    /// `Ok(None)` means both stops exist but are not connected.
    fn shortest_path(&self, from: &StopIdentifier, to: &StopIdentifier)
        -> Result<Option<RoutePath>>;

    /// The stop after `id` in route order and how far away it is
    fn next_stop(&self, id: &StopIdentifier) -> Result<NextStop>;
}
