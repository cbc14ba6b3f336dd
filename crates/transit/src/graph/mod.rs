//! Weighted stop graph and shortest-path search.

mod dijkstra;
pub mod route_graph;

pub use route_graph::RouteGraph;
