pub mod console;
pub mod doctor;
pub mod geometry;
pub mod history;
pub mod presenter;
pub mod state;

use std::time::Duration;

use serde::Deserialize;

pub use console::{Console, Event, Output};
pub use presenter::{LogPresenter, Presenter, UiUpdate};
pub use state::{ControlState, ControlStateMachine, Interlock, Mode, SweepDirection, TimerRequest};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Auto-sweep tick period.
    pub sweep_interval_ms: u64,

    /// Degrees advanced per sweep tick.
    pub sweep_step_deg: u8,

    /// Interlock timer period while the laser is engaged.
    pub interlock_timeout_ms: u64,

    /// Radar returns closer than this engage the laser.
    pub laser_trigger_distance_cm: f32,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ms: 50,
            sweep_step_deg: 2,
            interlock_timeout_ms: 2000,
            laser_trigger_distance_cm: 50.0,
        }
    }
}

impl ControlConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn interlock_timeout(&self) -> Duration {
        Duration::from_millis(self.interlock_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub detection_capacity: usize,

    /// Rows in the battery history table.
    pub battery_window: usize,

    /// Power reading shown as 100% on the battery gauge.
    pub max_expected_power_mw: f32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            detection_capacity: 50,
            battery_window: 7,
            max_expected_power_mw: 5000.0,
        }
    }
}
