//! Undirected stop graph with segment distances in meters.

use std::collections::HashMap;

use super::dijkstra::{dijkstra_path, Edge};
use crate::identifiers::StopIdentifier;
use crate::models::types::{Result, RoutePath, TransitError};

/// Simple undirected graph keyed by stop identifier.
///
/// Nodes are stored in an arena; adjacency refers to them by index. At most
/// one edge exists per pair of nodes.
#[derive(Clone, Debug, Default)]
pub struct RouteGraph {
    ids: Vec<StopIdentifier>,
    index: HashMap<StopIdentifier, usize>,
    adjacency: Vec<Vec<Edge>>,
}

impl RouteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node; does nothing if it is already known.
    pub fn add_node(&mut self, id: StopIdentifier) -> usize {
        if let Some(&node) = self.index.get(&id) {
            return node;
        }

        let node = self.ids.len();
        self.index.insert(id.clone(), node);
        self.ids.push(id);
        self.adjacency.push(Vec::new());
        node
    }

    /// Connect two stops, creating them as needed.
    ///
    /// An existing edge between the same pair takes the new weight.
    pub fn add_edge(&mut self, a: StopIdentifier, b: StopIdentifier, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(TransitError::InvalidData(format!(
                "edge {a} - {b} has invalid weight {weight}"
            )));
        }

        let a = self.add_node(a);
        let b = self.add_node(b);
        self.upsert(a, b, weight);
        if a != b {
            self.upsert(b, a, weight);
        }
        Ok(())
    }

    fn upsert(&mut self, from: usize, to: usize, weight: f64) {
        let edges = &mut self.adjacency[from];
        match edges.iter_mut().find(|e| e.to == to) {
            Some(edge) => edge.weight = weight,
            None => edges.push(Edge { to, weight }),
        }
    }

    pub fn contains(&self, id: &StopIdentifier) -> bool {
        self.index.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        let (loops, others) = self
            .adjacency
            .iter()
            .enumerate()
            .flat_map(|(from, edges)| edges.iter().map(move |e| e.to == from))
            .fold((0, 0), |(l, o), is_loop| {
                if is_loop { (l + 1, o) } else { (l, o + 1) }
            });
        loops + others / 2
    }

    /// Weight of the edge between two stops, if they are adjacent
    pub fn weight(&self, a: &StopIdentifier, b: &StopIdentifier) -> Option<f64> {
        let a = *self.index.get(a)?;
        let b = *self.index.get(b)?;
        self.adjacency[a]
            .iter()
            .find(|e| e.to == b)
            .map(|e| e.weight)
    }

    /// Neighbors of a stop with the connecting edge weights
    pub fn neighbors(&self, id: &StopIdentifier) -> Option<Vec<(&StopIdentifier, f64)>> {
        let node = *self.index.get(id)?;
        Some(
            self.adjacency[node]
                .iter()
                .map(|e| (&self.ids[e.to], e.weight))
                .collect(),
        )
    }

    fn node_of(&self, id: &StopIdentifier) -> Result<usize> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| TransitError::StopNotFound(id.clone()))
    }

    /// Minimum-weight path between two known stops.
    ///
    /// `Ok(None)` means no path exists; unknown stops are an error.
    pub fn shortest_path(
        &self,
        source: &StopIdentifier,
        target: &StopIdentifier,
    ) -> Result<Option<RoutePath>> {
        let start = self.node_of(source)?;
        let goal = self.node_of(target)?;

        let path = dijkstra_path(&self.adjacency, start, goal).map(|(distance_m, nodes)| {
            let stops = nodes.into_iter().map(|n| self.ids[n].clone()).collect();
            RoutePath { distance_m, stops }
        });
        Ok(path)
    }
}
