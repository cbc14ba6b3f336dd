pub mod config;
pub mod error;
pub mod liveness;
pub mod session;

// Re-export transit from the transit crate
pub use shuttle_transit as transit;

pub use config::{LivenessConfig, ShuttleConfig};
pub use error::{Error, Result};
pub use liveness::{FleetTracker, PositionReport, ServiceStatus, VehicleSnapshot};
pub use session::MapSession;
