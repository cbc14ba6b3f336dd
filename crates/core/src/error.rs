use shuttle_transit::{TransitError, VehicleIdentifier};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Vehicle not tracked: {0}")]
    VehicleNotTracked(VehicleIdentifier),
    #[error("Tracker for vehicle {0} has stopped")]
    TrackerClosed(VehicleIdentifier),
    #[error("Invalid position for vehicle {vehicle}: ({lat}, {lon})")]
    InvalidPosition {
        vehicle: VehicleIdentifier,
        lat: f64,
        lon: f64,
    },
    #[error("No Tokio runtime available to track vehicle {0}")]
    NoRuntime(VehicleIdentifier),
    #[error("Transit error: {0}")]
    Transit(#[from] TransitError),
}

pub type Result<T> = std::result::Result<T, Error>;
