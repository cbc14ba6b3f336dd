//! Pluggable data-access traits.
//!
//! The backend that stores stops and pushes vehicle positions lives outside
//! this crate. Implement these to connect it.

use std::future::Future;
use std::pin::Pin;

use crate::models::types::{Result, Stop};

/// One-shot source of the stop list for a map session.
///
/// Implementations return active stops only, ordered by `seq` ascending.
pub trait StopLoader: Send + Sync {
    fn load_stops<'a>(&'a self) -> Pin<Box<dyn Future<Output = Result<Vec<Stop>>> + Send + 'a>>;
}
