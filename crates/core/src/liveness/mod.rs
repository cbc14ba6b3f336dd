//! Vehicle service status derived from sparse position reports.

pub mod state;
pub mod tracker;

pub use state::{LivenessRecord, ServiceStatus, VehicleSnapshot};
pub use tracker::{FleetTracker, PositionReport};
