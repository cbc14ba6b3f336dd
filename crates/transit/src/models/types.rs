//! Core data types for the shuttle stop network.

use std::sync::Arc;

use geo::Point;

use crate::identifiers::*;

// ============================================================================
// Data Structures
// ============================================================================

/// A shuttle stop as delivered by the data backend.
///
/// Stops arrive pre-filtered to `active` and pre-sorted by `seq`; the core
/// never re-sorts or re-filters them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Stop {
    pub id: StopIdentifier,
    pub name: Arc<str>,
    pub lat: f64,
    pub lon: f64,
    /// Canonical position along the route
    pub seq: u32,
    pub active: bool,
}

impl Stop {
    pub fn new(
        id: impl Into<StopIdentifier>,
        name: impl AsRef<str>,
        lat: f64,
        lon: f64,
        seq: u32,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.as_ref().into(),
            lat,
            lon,
            seq,
            active: true,
        }
    }

    /// Location as a `geo::Point` (x = longitude, y = latitude)
    pub fn location(&self) -> Point {
        Point::new(self.lon, self.lat)
    }

    /// Rejects records whose coordinates cannot be placed on the map.
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err(TransitError::InvalidData(format!(
                "stop {} has non-finite coordinates ({}, {})",
                self.id, self.lat, self.lon
            )));
        }
        Ok(())
    }
}

/// Result of resolving the closest stop to a point
#[derive(Clone, Debug)]
pub struct NearestStop {
    pub stop: Arc<Stop>,
    pub distance_m: f64,
}

/// A minimum-weight path through the route graph
#[derive(Clone, Debug, PartialEq)]
pub struct RoutePath {
    pub distance_m: f64,
    /// Stops visited, source first and target last
    pub stops: Vec<StopIdentifier>,
}

/// The stop that follows another one along the route
#[derive(Clone, Debug)]
pub enum NextStop {
    Next { stop: Arc<Stop>, distance_m: f64 },
    EndOfRoute,
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Stop not found: {0}")]
    StopNotFound(StopIdentifier),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;
