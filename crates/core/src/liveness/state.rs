//! Per-vehicle status machine.
//!
//! Pure state: the caller supplies the clock and owns the offline deadline.
//! [`super::tracker`] drives it from a Tokio task.

use chrono::{DateTime, Utc};
use geo::Point;
use serde::Serialize;
use shuttle_transit::{VehicleIdentifier, spatial::haversine_distance};
use tokio::time::Instant;

use crate::config::LivenessConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Moving, or stopped for less than the quiet window
    Active,
    /// Still broadcasting but stationary for longer than the quiet window
    Waiting,
    /// No report for longer than the offline timeout
    Offline,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Active => "active",
            ServiceStatus::Waiting => "waiting",
            ServiceStatus::Offline => "offline",
        }
    }
}

/// Point-in-time view of a vehicle for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSnapshot {
    pub vehicle_id: VehicleIdentifier,
    pub lat: f64,
    pub lon: f64,
    pub status: ServiceStatus,
    pub last_signal_at: DateTime<Utc>,
    pub last_movement_at: DateTime<Utc>,
}

/// Last known state of one tracked vehicle.
///
/// Only exists once a first report has arrived.
#[derive(Debug, Clone)]
pub struct LivenessRecord {
    vehicle_id: VehicleIdentifier,
    position: Point,
    status: ServiceStatus,
    last_movement: Instant,
    last_signal: Instant,
    last_movement_at: DateTime<Utc>,
    last_signal_at: DateTime<Utc>,
}

impl LivenessRecord {
    /// Record for a vehicle's first report; starts `Active`.
    pub fn first_report(
        vehicle_id: VehicleIdentifier,
        position: Point,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> Self {
        Self {
            vehicle_id,
            position,
            status: ServiceStatus::Active,
            last_movement: now,
            last_signal: now,
            last_movement_at: wall,
            last_signal_at: wall,
        }
    }

    pub fn vehicle_id(&self) -> &VehicleIdentifier {
        &self.vehicle_id
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    /// Apply a position report received at `now`. Returns the previous status.
    ///
    /// Uses the receipt time, never a timestamp carried by the report.
    pub fn observe(
        &mut self,
        position: Point,
        now: Instant,
        wall: DateTime<Utc>,
        config: &LivenessConfig,
    ) -> ServiceStatus {
        let previous = self.status;

        if self.has_moved(position, config.movement_threshold_m) {
            self.position = position;
            self.last_movement = now;
            self.last_movement_at = wall;
            self.status = ServiceStatus::Active;
        } else if now.saturating_duration_since(self.last_movement) > config.quiet_window() {
            self.status = ServiceStatus::Waiting;
        } else {
            self.status = ServiceStatus::Active;
        }

        self.last_signal = now;
        self.last_signal_at = wall;
        previous
    }

    /// The offline deadline elapsed without a newer report. Returns the previous status.
    pub fn expire(&mut self) -> ServiceStatus {
        std::mem::replace(&mut self.status, ServiceStatus::Offline)
    }

    /// When the vehicle goes offline unless another report arrives first
    pub fn offline_deadline(&self, config: &LivenessConfig) -> Instant {
        self.last_signal + config.offline_timeout()
    }

    fn has_moved(&self, position: Point, threshold_m: f64) -> bool {
        if position == self.position {
            return false;
        }
        threshold_m <= 0.0 || haversine_distance(self.position, position) > threshold_m
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            vehicle_id: self.vehicle_id.clone(),
            lat: self.position.y(),
            lon: self.position.x(),
            status: self.status,
            last_signal_at: self.last_signal_at,
            last_movement_at: self.last_movement_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const STOPPED: (f64, f64) = (-70.0219, -15.84);

    fn record(now: Instant) -> LivenessRecord {
        LivenessRecord::first_report(
            VehicleIdentifier::new("bus_1"),
            Point::new(STOPPED.0, STOPPED.1),
            now,
            Utc::now(),
        )
    }

    fn at(start: Instant, secs: u64) -> Instant {
        start + Duration::from_secs(secs)
    }

    #[test]
    fn test_first_report_is_active() {
        let start = Instant::now();
        let record = record(start);

        assert_eq!(record.status(), ServiceStatus::Active);
        let config = LivenessConfig::default();
        assert_eq!(record.offline_deadline(&config), at(start, 65));
    }

    #[test]
    fn test_stationary_reports_turn_waiting_after_quiet_window() {
        let config = LivenessConfig::default();
        let start = Instant::now();
        let mut record = record(start);
        let here = Point::new(STOPPED.0, STOPPED.1);

        for secs in (5..=60).step_by(5) {
            record.observe(here, at(start, secs), Utc::now(), &config);
            assert_eq!(record.status(), ServiceStatus::Active, "at {secs}s");
        }

        let previous = record.observe(here, at(start, 65), Utc::now(), &config);
        assert_eq!(previous, ServiceStatus::Active);
        assert_eq!(record.status(), ServiceStatus::Waiting);
        assert_eq!(record.offline_deadline(&config), at(start, 130));
    }

    #[test]
    fn test_movement_resets_quiet_window() {
        let config = LivenessConfig::default();
        let start = Instant::now();
        let mut record = record(start);
        let stopped = Point::new(STOPPED.0, STOPPED.1);

        record.observe(stopped, at(start, 61), Utc::now(), &config);
        assert_eq!(record.status(), ServiceStatus::Waiting);

        let moved = Point::new(-70.0210, -15.8390);
        record.observe(moved, at(start, 62), Utc::now(), &config);
        assert_eq!(record.status(), ServiceStatus::Active);
        assert_eq!(record.position(), moved);

        record.observe(moved, at(start, 122), Utc::now(), &config);
        assert_eq!(record.status(), ServiceStatus::Active);
        record.observe(moved, at(start, 123), Utc::now(), &config);
        assert_eq!(record.status(), ServiceStatus::Waiting);
    }

    #[test]
    fn test_expire_goes_offline_and_report_revives() {
        let config = LivenessConfig::default();
        let start = Instant::now();
        let mut record = record(start);

        assert_eq!(record.expire(), ServiceStatus::Active);
        assert_eq!(record.status(), ServiceStatus::Offline);

        // Same spot after a long silence: stationary beyond the quiet window
        let stopped = Point::new(STOPPED.0, STOPPED.1);
        record.observe(stopped, at(start, 200), Utc::now(), &config);
        assert_eq!(record.status(), ServiceStatus::Waiting);
    }

    #[test]
    fn test_movement_threshold() {
        let config = LivenessConfig {
            movement_threshold_m: 10.0,
            ..LivenessConfig::default()
        };
        let start = Instant::now();
        let mut record = record(start);

        // About 1 m of GPS jitter does not count as movement
        let jitter = Point::new(STOPPED.0, STOPPED.1 + 0.00001);
        record.observe(jitter, at(start, 61), Utc::now(), &config);
        assert_eq!(record.status(), ServiceStatus::Waiting);
        assert_eq!(record.position(), Point::new(STOPPED.0, STOPPED.1));

        // About 110 m does
        let moved = Point::new(STOPPED.0, STOPPED.1 + 0.001);
        record.observe(moved, at(start, 62), Utc::now(), &config);
        assert_eq!(record.status(), ServiceStatus::Active);
        assert_eq!(record.position(), moved);
    }

    #[test]
    fn test_exact_equality_by_default() {
        let config = LivenessConfig::default();
        let start = Instant::now();
        let mut record = record(start);

        let jitter = Point::new(STOPPED.0, STOPPED.1 + 0.00001);
        record.observe(jitter, at(start, 61), Utc::now(), &config);
        assert_eq!(record.status(), ServiceStatus::Active);
    }

    #[test]
    fn test_snapshot() {
        let record = record(Instant::now());
        let snapshot = record.snapshot();

        assert_eq!(snapshot.vehicle_id.as_str(), "bus_1");
        assert_eq!(snapshot.lat, STOPPED.1);
        assert_eq!(snapshot.lon, STOPPED.0);
        assert_eq!(snapshot.status.as_str(), "active");
        assert_eq!(snapshot.last_signal_at, snapshot.last_movement_at);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_value(record(Instant::now()).snapshot()).unwrap();

        assert_eq!(json["vehicle_id"], "bus_1");
        assert_eq!(json["status"], "active");
        assert_eq!(json["lat"], STOPPED.1);
    }
}
