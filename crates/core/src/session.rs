//! Session-scoped context owning the current stop generation and the fleet.

use std::sync::{Arc, PoisonError, RwLock};

use geo::Point;
use shuttle_transit::{
    IndexConfig, NearestStop, NextStop, RoutePath, StaticStopProvider, Stop, StopIdentifier,
    StopLoader, StopProvider, VehicleIdentifier,
};
use tracing::info;

use crate::config::ShuttleConfig;
use crate::error::Result;
use crate::liveness::{FleetTracker, PositionReport, ServiceStatus};

/// Everything the map view needs for one session.
///
/// Stop data is held as an immutable generation behind an `Arc`. A reload
/// builds the next generation without holding the lock and then swaps it in,
/// so readers see either the old stops or the new ones, never a mix.
pub struct MapSession {
    index: IndexConfig,
    stops: RwLock<Arc<StaticStopProvider>>,
    fleet: FleetTracker,
}

impl MapSession {
    pub fn new(config: ShuttleConfig) -> Self {
        let ShuttleConfig { index, liveness } = config;
        Self {
            stops: RwLock::new(Arc::new(StaticStopProvider::new(&index))),
            index,
            fleet: FleetTracker::new(liveness),
        }
    }

    /// Replace the stop generation with `stops` (active, ordered by `seq`).
    ///
    /// On error the previous generation stays in place.
    pub fn load_stops(&self, stops: Vec<Stop>) -> Result<()> {
        let provider = StaticStopProvider::from_stops(stops, &self.index)?;
        info!(
            stops = provider.len(),
            indexed = provider.indexed_len(),
            "stop generation loaded"
        );

        *self.stops.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(provider);
        Ok(())
    }

    /// Fetch stops from the backend and load them. Returns the stop count.
    pub async fn reload_from(&self, loader: &dyn StopLoader) -> Result<usize> {
        let stops = loader.load_stops().await?;
        let count = stops.len();
        self.load_stops(stops)?;
        Ok(count)
    }

    /// The current stop generation
    pub fn stops(&self) -> Arc<StaticStopProvider> {
        Arc::clone(&self.stops.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn nearest_stop(&self, point: Point) -> Option<NearestStop> {
        self.stops().nearest_stop(point)
    }

    pub fn shortest_path(
        &self,
        from: &StopIdentifier,
        to: &StopIdentifier,
    ) -> Result<Option<RoutePath>> {
        Ok(self.stops().shortest_path(from, to)?)
    }

    pub fn next_stop(&self, id: &StopIdentifier) -> Result<NextStop> {
        Ok(self.stops().next_stop(id)?)
    }

    pub fn search_stops(&self, term: &str) -> Vec<Arc<Stop>> {
        self.stops().search_stops(term)
    }

    pub fn fleet(&self) -> &FleetTracker {
        &self.fleet
    }

    /// Apply a vehicle position report
    pub async fn report_position(&self, report: PositionReport) -> Result<ServiceStatus> {
        self.fleet.report(report).await
    }

    pub fn status(&self, vehicle: &VehicleIdentifier) -> Option<ServiceStatus> {
        self.fleet.status(vehicle)
    }
}
