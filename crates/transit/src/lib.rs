//! # shuttle-transit
//!
//! Stop network for a campus shuttle map.
//!
//! ## Features
//!
//! - **Spatial queries**: quadrant tree over the service area
//! - **Nearest stop**: index-assisted lookup with an exhaustive fallback
//! - **Route graph**: stops joined in route order, Dijkstra shortest paths
//! - **Pluggable loading**: implement [`StopLoader`] for your backend
//!
//! ## Example
//!
//! ```
//! use shuttle_transit::prelude::*;
//! use geo::Point;
//!
//! let stops = vec![
//!     Stop::new("a", "Puerta Principal", -15.8240, -70.0160, 0),
//!     Stop::new("b", "Biblioteca Central", -15.8270, -70.0185, 1),
//! ];
//!
//! let provider = StaticStopProvider::from_stops(stops, &IndexConfig::default()).unwrap();
//!
//! let nearest = provider.nearest_stop(Point::new(-70.0184, -15.8269)).unwrap();
//! assert_eq!(nearest.stop.id.as_str(), "b");
//!
//! let path = provider
//!     .shortest_path(&StopIdentifier::new("a"), &StopIdentifier::new("b"))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(path.stops.len(), 2);
//! ```

pub mod graph;
pub mod identifiers;
pub mod models;
pub mod network;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::graph::RouteGraph;
    pub use crate::identifiers::*;
    pub use crate::models::{traits::*, types::*};
    pub use crate::network::traits::*;
    pub use crate::provider::{IndexConfig, StaticStopProvider};
    pub use crate::spatial::{haversine_distance, QuadTree, Rectangle};
}

pub use prelude::*;
