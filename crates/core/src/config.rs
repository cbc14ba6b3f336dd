use std::time::Duration;

use serde::Deserialize;
use shuttle_transit::IndexConfig;

/// Settings for one map session.
///
/// Every field has a default, so an empty document deserializes to the
/// campus deployment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShuttleConfig {
    /// Quadtree region, node capacity and nearest-stop search box
    #[serde(default)]
    pub index: IndexConfig,
    /// Vehicle status thresholds
    #[serde(default)]
    pub liveness: LivenessConfig,
}

/// Thresholds for the vehicle status machine
#[derive(Debug, Clone, Deserialize)]
pub struct LivenessConfig {
    /// Seconds without movement before a broadcasting vehicle counts as waiting (default: 60)
    #[serde(default = "LivenessConfig::default_quiet_window_secs")]
    pub quiet_window_secs: u64,
    /// Seconds without any signal before a vehicle counts as offline (default: 65)
    #[serde(default = "LivenessConfig::default_offline_timeout_secs")]
    pub offline_timeout_secs: u64,
    /// Displacement in meters a report must exceed to count as movement.
    /// Zero means any coordinate change counts (default: 0)
    #[serde(default)]
    pub movement_threshold_m: f64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            quiet_window_secs: Self::default_quiet_window_secs(),
            offline_timeout_secs: Self::default_offline_timeout_secs(),
            movement_threshold_m: 0.0,
        }
    }
}

impl LivenessConfig {
    fn default_quiet_window_secs() -> u64 {
        60
    }
    fn default_offline_timeout_secs() -> u64 {
        65
    }

    pub fn quiet_window(&self) -> Duration {
        Duration::from_secs(self.quiet_window_secs)
    }

    pub fn offline_timeout(&self) -> Duration {
        Duration::from_secs(self.offline_timeout_secs)
    }
}
