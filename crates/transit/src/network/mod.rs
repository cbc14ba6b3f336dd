//! Backend access abstractions.

pub mod traits;

pub use traits::StopLoader;
