//! Fleet-wide liveness tracking.
//!
//! Each vehicle gets its own Tokio task fed by an unbounded channel, so its
//! reports are applied in arrival order. The task owns the vehicle's single
//! offline deadline and resets it on every report; stopping the task is the
//! only way to cancel it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use geo::Point;
use shuttle_transit::VehicleIdentifier;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::LivenessConfig;
use crate::error::{Error, Result};
use crate::liveness::state::{LivenessRecord, ServiceStatus, VehicleSnapshot};

/// One report from a vehicle's transmitter
#[derive(Debug, Clone, PartialEq)]
pub struct PositionReport {
    pub vehicle_id: VehicleIdentifier,
    pub lat: f64,
    pub lon: f64,
}

impl PositionReport {
    pub fn new(vehicle_id: impl Into<VehicleIdentifier>, lat: f64, lon: f64) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            lat,
            lon,
        }
    }
}

struct Command {
    position: Point,
    ack: Option<oneshot::Sender<ServiceStatus>>,
}

struct VehicleHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<VehicleSnapshot>,
    task: JoinHandle<()>,
}

enum Dispatched {
    Created(ServiceStatus),
    Queued,
}

/// Status machines for every vehicle seen in this session
pub struct FleetTracker {
    config: LivenessConfig,
    vehicles: Mutex<HashMap<VehicleIdentifier, VehicleHandle>>,
}

impl FleetTracker {
    pub fn new(config: LivenessConfig) -> Self {
        Self {
            config,
            vehicles: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    fn vehicles(&self) -> MutexGuard<'_, HashMap<VehicleIdentifier, VehicleHandle>> {
        self.vehicles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a report without waiting for it to be applied.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, report: PositionReport) -> Result<()> {
        self.dispatch(report, None).map(|_| ())
    }

    /// Apply a report and return the vehicle's resulting status.
    pub async fn report(&self, report: PositionReport) -> Result<ServiceStatus> {
        let vehicle = report.vehicle_id.clone();
        let (ack, applied) = oneshot::channel();

        match self.dispatch(report, Some(ack))? {
            Dispatched::Created(status) => Ok(status),
            Dispatched::Queued => applied.await.map_err(|_| Error::TrackerClosed(vehicle)),
        }
    }

    /// Feed reports from an inbound stream until it closes.
    ///
    /// Reports that cannot be applied are logged and skipped.
    pub async fn run(&self, mut feed: mpsc::Receiver<PositionReport>) {
        while let Some(report) = feed.recv().await {
            if let Err(e) = self.submit(report) {
                tracing::warn!("dropping position report: {e}");
            }
        }
        debug!("position feed closed");
    }

    fn dispatch(
        &self,
        report: PositionReport,
        ack: Option<oneshot::Sender<ServiceStatus>>,
    ) -> Result<Dispatched> {
        let PositionReport {
            vehicle_id,
            lat,
            lon,
        } = report;

        if !lat.is_finite() || !lon.is_finite() {
            return Err(Error::InvalidPosition {
                vehicle: vehicle_id,
                lat,
                lon,
            });
        }
        let position = Point::new(lon, lat);

        let mut vehicles = self.vehicles();

        if let Some(handle) = vehicles.get(&vehicle_id) {
            return handle
                .commands
                .send(Command { position, ack })
                .map(|()| Dispatched::Queued)
                .map_err(|_| Error::TrackerClosed(vehicle_id));
        }

        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime(vehicle_id.clone()))?;

        let record =
            LivenessRecord::first_report(vehicle_id.clone(), position, Instant::now(), Utc::now());
        let status = record.status();
        let (commands, receiver) = mpsc::unbounded_channel();
        let (publisher, snapshot) = watch::channel(record.snapshot());

        debug!(vehicle = %vehicle_id, "tracking new vehicle");
        let task = runtime.spawn(track_vehicle(
            record,
            self.config.clone(),
            receiver,
            publisher,
        ));

        vehicles.insert(
            vehicle_id,
            VehicleHandle {
                commands,
                snapshot,
                task,
            },
        );

        if let Some(ack) = ack {
            let _ = ack.send(status);
        }
        Ok(Dispatched::Created(status))
    }

    /// Current status, `None` for a vehicle that has never reported
    pub fn status(&self, vehicle: &VehicleIdentifier) -> Option<ServiceStatus> {
        self.vehicles()
            .get(vehicle)
            .map(|handle| handle.snapshot.borrow().status)
    }

    pub fn snapshot(&self, vehicle: &VehicleIdentifier) -> Result<VehicleSnapshot> {
        self.vehicles()
            .get(vehicle)
            .map(|handle| handle.snapshot.borrow().clone())
            .ok_or_else(|| Error::VehicleNotTracked(vehicle.clone()))
    }

    /// Subscribe to status changes of one vehicle
    pub fn watch(&self, vehicle: &VehicleIdentifier) -> Result<watch::Receiver<VehicleSnapshot>> {
        self.vehicles()
            .get(vehicle)
            .map(|handle| handle.snapshot.clone())
            .ok_or_else(|| Error::VehicleNotTracked(vehicle.clone()))
    }

    pub fn vehicles_tracked(&self) -> Vec<VehicleIdentifier> {
        self.vehicles().keys().cloned().collect()
    }

    /// Stop tracking a vehicle, cancelling its pending offline deadline.
    ///
    /// Returns `false` if the vehicle was not tracked.
    pub fn remove(&self, vehicle: &VehicleIdentifier) -> bool {
        match self.vehicles().remove(vehicle) {
            Some(handle) => {
                handle.task.abort();
                debug!(vehicle = %vehicle, "stopped tracking vehicle");
                true
            }
            None => false,
        }
    }

    /// Stop tracking every vehicle
    pub fn clear(&self) {
        for (_, handle) in self.vehicles().drain() {
            handle.task.abort();
        }
    }
}

impl Drop for FleetTracker {
    fn drop(&mut self) {
        self.clear();
    }
}

async fn track_vehicle(
    mut record: LivenessRecord,
    config: LivenessConfig,
    mut commands: mpsc::UnboundedReceiver<Command>,
    publisher: watch::Sender<VehicleSnapshot>,
) {
    let deadline = tokio::time::sleep_until(record.offline_deadline(&config));
    tokio::pin!(deadline);
    let mut armed = true;

    loop {
        tokio::select! {
            biased;

            command = commands.recv() => {
                let Some(Command { position, ack }) = command else {
                    break;
                };

                let previous = record.observe(position, Instant::now(), Utc::now(), &config);
                deadline.as_mut().reset(record.offline_deadline(&config));
                armed = true;

                log_transition(&record, previous);
                publisher.send_replace(record.snapshot());
                if let Some(ack) = ack {
                    let _ = ack.send(record.status());
                }
            }
            () = &mut deadline, if armed => {
                armed = false;
                let previous = record.expire();

                log_transition(&record, previous);
                publisher.send_replace(record.snapshot());
            }
        }
    }

    debug!(vehicle = %record.vehicle_id(), "vehicle task finished");
}

fn log_transition(record: &LivenessRecord, previous: ServiceStatus) {
    if previous != record.status() {
        debug!(
            vehicle = %record.vehicle_id(),
            from = previous.as_str(),
            to = record.status().as_str(),
            "vehicle status changed"
        );
    } else {
        trace!(vehicle = %record.vehicle_id(), status = previous.as_str(), "vehicle report");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;

    const LAT: f64 = -15.84;
    const LON: f64 = -70.0219;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .try_init();
    }

    fn bus() -> VehicleIdentifier {
        VehicleIdentifier::new("bus_1")
    }

    fn tracker() -> FleetTracker {
        init_tracing();
        FleetTracker::new(LivenessConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_vehicle_has_no_status() {
        let tracker = tracker();

        assert_eq!(tracker.status(&bus()), None);
        assert!(matches!(
            tracker.snapshot(&bus()),
            Err(Error::VehicleNotTracked(_))
        ));
        assert!(!tracker.remove(&bus()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stationary_vehicle_turns_waiting() {
        let tracker = tracker();

        let mut statuses = Vec::new();
        for _ in 0..=14 {
            let report = PositionReport::new("bus_1", LAT, LON);
            statuses.push(tracker.report(report).await.unwrap());
            sleep(Duration::from_secs(5)).await;
        }

        // Reports at 0..=60s are active, the one at 65s is the first past the quiet window
        assert!(statuses[..13].iter().all(|s| *s == ServiceStatus::Active));
        assert_eq!(statuses[13], ServiceStatus::Waiting);
        assert_eq!(statuses[14], ServiceStatus::Waiting);
        assert_eq!(tracker.status(&bus()), Some(ServiceStatus::Waiting));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silence_turns_offline() {
        let tracker = tracker();
        tracker.report(PositionReport::new("bus_1", LAT, LON)).await.unwrap();

        sleep(Duration::from_secs(64)).await;
        assert_eq!(tracker.status(&bus()), Some(ServiceStatus::Active));

        sleep(Duration::from_secs(2)).await;
        assert_eq!(tracker.status(&bus()), Some(ServiceStatus::Offline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_report_rearms_deadline() {
        let tracker = tracker();

        for _ in 0..4 {
            tracker.report(PositionReport::new("bus_1", LAT, LON)).await.unwrap();
            sleep(Duration::from_secs(40)).await;
        }

        // 160s in, but never more than 40s between reports
        assert_eq!(tracker.status(&bus()), Some(ServiceStatus::Waiting));

        sleep(Duration::from_secs(26)).await;
        assert_eq!(tracker.status(&bus()), Some(ServiceStatus::Offline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_movement_after_stall_reactivates() {
        let tracker = tracker();
        tracker.report(PositionReport::new("bus_1", LAT, LON)).await.unwrap();

        sleep(Duration::from_secs(61)).await;
        let stalled = tracker.report(PositionReport::new("bus_1", LAT, LON)).await.unwrap();
        assert_eq!(stalled, ServiceStatus::Waiting);

        let moved = tracker
            .report(PositionReport::new("bus_1", LAT + 0.001, LON))
            .await
            .unwrap();
        assert_eq!(moved, ServiceStatus::Active);

        // Both windows restart from the movement
        sleep(Duration::from_secs(60)).await;
        let still = tracker
            .report(PositionReport::new("bus_1", LAT + 0.001, LON))
            .await
            .unwrap();
        assert_eq!(still, ServiceStatus::Active);

        sleep(Duration::from_secs(64)).await;
        assert_eq!(tracker.status(&bus()), Some(ServiceStatus::Active));
        sleep(Duration::from_secs(2)).await;
        assert_eq!(tracker.status(&bus()), Some(ServiceStatus::Offline));
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_vehicle_comes_back() {
        let tracker = tracker();
        tracker.report(PositionReport::new("bus_1", LAT, LON)).await.unwrap();

        sleep(Duration::from_secs(100)).await;
        assert_eq!(tracker.status(&bus()), Some(ServiceStatus::Offline));

        let status = tracker
            .report(PositionReport::new("bus_1", LAT, LON + 0.002))
            .await
            .unwrap();
        assert_eq!(status, ServiceStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vehicles_are_independent() {
        let tracker = tracker();
        tracker.report(PositionReport::new("bus_1", LAT, LON)).await.unwrap();
        sleep(Duration::from_secs(30)).await;
        tracker.report(PositionReport::new("bus_2", LAT, LON)).await.unwrap();

        sleep(Duration::from_secs(40)).await;
        assert_eq!(tracker.status(&bus()), Some(ServiceStatus::Offline));
        assert_eq!(
            tracker.status(&VehicleIdentifier::new("bus_2")),
            Some(ServiceStatus::Active)
        );

        let mut tracked = tracker.vehicles_tracked();
        tracked.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        assert_eq!(tracked, vec![bus(), VehicleIdentifier::new("bus_2")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_cancels_deadline() {
        let tracker = tracker();
        tracker.report(PositionReport::new("bus_1", LAT, LON)).await.unwrap();
        let mut updates = tracker.watch(&bus()).unwrap();
        updates.mark_unchanged();

        assert!(tracker.remove(&bus()));
        sleep(Duration::from_secs(120)).await;

        assert_eq!(tracker.status(&bus()), None);
        // The task is gone, so no offline transition was ever published
        assert!(!updates.has_changed().unwrap_or(false));
        assert_eq!(updates.borrow().status, ServiceStatus::Active);

        // A later report starts a fresh record
        let status = tracker.report(PositionReport::new("bus_1", LAT, LON)).await.unwrap();
        assert_eq!(status, ServiceStatus::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_invalid_position() {
        let tracker = tracker();
        let result = tracker.report(PositionReport::new("bus_1", f64::NAN, LON)).await;

        assert!(matches!(result, Err(Error::InvalidPosition { .. })));
        assert_eq!(tracker.status(&bus()), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_consumes_feed() {
        let tracker = Arc::new(tracker());
        let (sender, feed) = mpsc::channel(16);

        let runner = tokio::spawn({
            let tracker = Arc::clone(&tracker);
            async move { tracker.run(feed).await }
        });

        sender.send(PositionReport::new("bus_1", LAT, LON)).await.unwrap();
        sender.send(PositionReport::new("bus_2", LAT, LON)).await.unwrap();
        drop(sender);
        runner.await.unwrap();

        assert_eq!(tracker.status(&bus()), Some(ServiceStatus::Active));
        let snapshot = tracker.snapshot(&VehicleIdentifier::new("bus_2")).unwrap();
        assert_eq!(snapshot.lat, LAT);
        assert_eq!(snapshot.lon, LON);
    }

    #[test]
    fn test_submit_outside_runtime() {
        let tracker = FleetTracker::new(LivenessConfig::default());
        let result = tracker.submit(PositionReport::new("bus_1", LAT, LON));

        assert!(matches!(result, Err(Error::NoRuntime(_))));
    }
}
