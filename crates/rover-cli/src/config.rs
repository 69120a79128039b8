use anyhow::{Context, Result};
use rover_control::{ControlConfig, HistoryConfig};
use rover_link::LinkConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Radar, laser and servo controller.
    pub radar: Option<LinkConfig>,
    /// Dedicated battery monitor (read only).
    pub battery: Option<LinkConfig>,
    /// Drive controller: motion commands and vehicle status.
    pub drive: Option<LinkConfig>,

    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

pub fn load_config(path: &str) -> Result<Config> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read config {}", path))?;
    toml::from_str(&s).context("parse config toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_full_config() {
        let file = write_config(
            r#"
            [radar]
            serial_dev = "/dev/ttyACM0"
            baud = 115200

            [battery]
            serial_dev = "/dev/ttyUSB1"
            baud = 115200

            [drive]
            enable = false
            serial_dev = "/dev/ttyUSB0"
            baud = 9600

            [control]
            sweep_interval_ms = 40
            laser_trigger_distance_cm = 35.0

            [history]
            battery_window = 10
            "#,
        );
        let cfg = load_config(file.path().to_str().unwrap()).unwrap();

        let radar = cfg.radar.unwrap();
        assert!(radar.enable);
        assert_eq!(radar.baud, 115200);
        assert!(!cfg.drive.unwrap().enable);
        assert_eq!(cfg.control.sweep_interval_ms, 40);
        assert_eq!(cfg.control.sweep_step_deg, 2);
        assert_eq!(cfg.control.laser_trigger_distance_cm, 35.0);
        assert_eq!(cfg.history.battery_window, 10);
        assert_eq!(cfg.history.detection_capacity, 50);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let file = write_config("");
        let cfg = load_config(file.path().to_str().unwrap()).unwrap();
        assert!(cfg.radar.is_none());
        assert_eq!(cfg.control.interlock_timeout_ms, 2000);
        assert_eq!(cfg.history.max_expected_power_mw, 5000.0);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config("/nonexistent/rover.toml").is_err());
    }
}
