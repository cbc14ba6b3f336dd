//! Spatial indexing and query utilities.

pub mod nearest;
pub mod quadtree;
pub mod queries;

pub use nearest::resolve_nearest;
pub use quadtree::{QuadTree, Rectangle};
pub use queries::haversine_distance;
