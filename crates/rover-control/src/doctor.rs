use anyhow::Result;

use crate::{ControlConfig, HistoryConfig};

pub fn check_control(cfg: &ControlConfig) -> Result<()> {
    anyhow::ensure!(cfg.sweep_interval_ms >= 10, "control.sweep_interval_ms too small (min 10)");
    anyhow::ensure!(
        (1..=180).contains(&cfg.sweep_step_deg),
        "control.sweep_step_deg should be 1..180"
    );
    anyhow::ensure!(cfg.interlock_timeout_ms > 0, "control.interlock_timeout_ms must be > 0");
    anyhow::ensure!(
        cfg.laser_trigger_distance_cm.is_finite() && cfg.laser_trigger_distance_cm > 0.0,
        "control.laser_trigger_distance_cm must be positive"
    );
    Ok(())
}

pub fn check_history(cfg: &HistoryConfig) -> Result<()> {
    anyhow::ensure!(cfg.detection_capacity >= 1, "history.detection_capacity must be >= 1");
    anyhow::ensure!(cfg.battery_window >= 1, "history.battery_window must be >= 1");
    anyhow::ensure!(
        cfg.max_expected_power_mw.is_finite() && cfg.max_expected_power_mw > 0.0,
        "history.max_expected_power_mw must be positive"
    );
    Ok(())
}
