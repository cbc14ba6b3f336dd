//! Stop data models, types, and traits.

pub mod traits;
pub mod types;

// Re-exports for convenience
pub use traits::StopProvider;
pub use types::{NearestStop, NextStop, Result, RoutePath, Stop, TransitError};
