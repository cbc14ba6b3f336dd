//! Stop data providers.

pub mod static_provider;

pub use static_provider::{IndexConfig, StaticStopProvider};
