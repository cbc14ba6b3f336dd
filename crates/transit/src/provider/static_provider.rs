//! In-memory stop provider for one loaded generation of stops.
//!
//! This is the core implementation that stores the stop list in memory
//! together with the quadtree and route graph built from it.

use std::collections::HashMap;
use std::sync::Arc;

use geo::Point;

use crate::graph::RouteGraph;
use crate::identifiers::*;
use crate::models::{traits::*, types::*};
use crate::spatial::{haversine_distance, resolve_nearest, QuadTree, Rectangle};

// ============================================================================
// Index Configuration
// ============================================================================

/// Spatial index settings, sized for the campus service area by default
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IndexConfig {
    /// Region covered by the quadtree (x = latitude, y = longitude)
    pub boundary: Rectangle,
    /// Points a quadtree node holds before it splits
    pub node_capacity: usize,
    /// Half-size in degrees of the box searched around a query point
    pub search_margin_deg: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            boundary: Rectangle::new(-15.84, -70.02, 0.05, 0.05),
            node_capacity: 4,
            search_margin_deg: 0.01,
        }
    }
}

// ============================================================================
// Static Provider
// ============================================================================

/// Immutable stop generation with spatial and route indices.
///
/// Built once per stop load and never mutated afterwards; a reload builds a
/// new provider and swaps it in.
#[derive(Debug)]
pub struct StaticStopProvider {
    // Core data, in route order
    stops: Vec<Arc<Stop>>,

    // Lookup map into `stops`
    stop_map: HashMap<StopIdentifier, usize>,

    // Indices; the quadtree stores positions in `stops`
    stop_tree: QuadTree<usize>,
    route_graph: RouteGraph,

    search_margin_deg: f64,
}

impl StaticStopProvider {
    /// Create an empty provider
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            stops: Vec::new(),
            stop_map: HashMap::new(),
            stop_tree: QuadTree::new(config.boundary, config.node_capacity),
            route_graph: RouteGraph::new(),
            search_margin_deg: config.search_margin_deg,
        }
    }

    /// Build provider from an ordered list of active stops.
    ///
    /// Consecutive stops are joined in the route graph by their great-circle
    /// distance. Stops outside the configured boundary are left out of the
    /// quadtree but remain reachable through the nearest-stop fallback.
    pub fn from_stops(stops: Vec<Stop>, config: &IndexConfig) -> Result<Self> {
        let mut provider = Self::new(config);

        for stop in stops {
            stop.validate()?;

            let index = provider.stops.len();
            if provider.stop_map.insert(stop.id.clone(), index).is_some() {
                return Err(TransitError::InvalidData(format!(
                    "duplicate stop id {}",
                    stop.id
                )));
            }

            provider.stop_tree.insert(stop.lat, stop.lon, index);
            provider.route_graph.add_node(stop.id.clone());
            provider.stops.push(Arc::new(stop));
        }

        for pair in provider.stops.windows(2) {
            let distance = haversine_distance(pair[0].location(), pair[1].location());
            provider
                .route_graph
                .add_edge(pair[0].id.clone(), pair[1].id.clone(), distance)?;
        }

        Ok(provider)
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Number of stops the quadtree accepted
    pub fn indexed_len(&self) -> usize {
        self.stop_tree.len()
    }

    pub fn route_graph(&self) -> &RouteGraph {
        &self.route_graph
    }
}

impl StopProvider for StaticStopProvider {
    fn get_stop(&self, id: &StopIdentifier) -> Option<Arc<Stop>> {
        self.stop_map.get(id).map(|&i| self.stops[i].clone())
    }

    fn all_stops(&self) -> &[Arc<Stop>] {
        &self.stops
    }

    fn search_stops(&self, term: &str) -> Vec<Arc<Stop>> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return Vec::new();
        }

        self.stops
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&term))
            .cloned()
            .collect()
    }

    fn stops_within(&self, range: &Rectangle) -> Vec<Arc<Stop>> {
        self.stop_tree
            .query(range)
            .into_iter()
            .map(|&i| self.stops[i].clone())
            .collect()
    }

    fn nearest_stop(&self, point: Point) -> Option<NearestStop> {
        resolve_nearest(
            point,
            Some(&self.stop_tree),
            &self.stops,
            self.search_margin_deg,
        )
    }

    fn shortest_path(
        &self,
        from: &StopIdentifier,
        to: &StopIdentifier,
    ) -> Result<Option<RoutePath>> {
        self.route_graph.shortest_path(from, to)
    }

    fn next_stop(&self, id: &StopIdentifier) -> Result<NextStop> {
        let index = *self
            .stop_map
            .get(id)
            .ok_or_else(|| TransitError::StopNotFound(id.clone()))?;

        let Some(next) = self.stops.get(index + 1) else {
            return Ok(NextStop::EndOfRoute);
        };

        Ok(match self.route_graph.shortest_path(id, &next.id)? {
            Some(path) => NextStop::Next {
                stop: next.clone(),
                distance_m: path.distance_m,
            },
            None => NextStop::EndOfRoute,
        })
    }
}
