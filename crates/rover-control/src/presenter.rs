use rover_proto::{BatterySample, VehicleStatus};
use tracing::{debug, info, trace};

use crate::geometry::NeedlePolygon;
use crate::history::{DetectionPoint, HistoryEntry};

/// One display change produced by the console. Presenters only receive
/// these; nothing is ever read back from the display.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    AngleLabel(f32),
    RangeLabel(f32),
    Needle(NeedlePolygon),
    DetectionAdded(DetectionPoint),
    DetectionEvicted(DetectionPoint),
    DetectionsCleared,
    BatteryLabels(BatterySample),
    PowerPercentage { percent: u8, text: String },
    HistoryRow(HistoryEntry),
    ControlsEnabled(bool),
    ModeLabel(&'static str),
    LaserStatus(&'static str),
    Slider(u8),
    VehicleStatus(VehicleStatus),
}

pub trait Presenter {
    fn apply(&mut self, update: &UiUpdate);
}

/// Renders display updates as log events under the `rover::ui` target.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn apply(&mut self, update: &UiUpdate) {
        match update {
            UiUpdate::AngleLabel(a) => debug!(target: "rover::ui", "angle {:.1}°", a),
            UiUpdate::RangeLabel(d) => debug!(target: "rover::ui", "range {:.1} cm", d),
            UiUpdate::Needle(p) => trace!(target: "rover::ui", needle = ?p.0),
            UiUpdate::DetectionAdded(p) => trace!(target: "rover::ui", x = p.x, y = p.y, "detection"),
            UiUpdate::DetectionEvicted(p) => trace!(target: "rover::ui", x = p.x, y = p.y, "detection expired"),
            UiUpdate::DetectionsCleared => info!(target: "rover::ui", "detections cleared"),
            UiUpdate::BatteryLabels(b) => info!(
                target: "rover::ui",
                "battery bus {:.2} V, shunt {:.2} mV, load {:.2} V, current {:.2} mA, power {:.2} mW",
                b.bus_voltage, b.shunt_voltage, b.load_voltage, b.current, b.power
            ),
            UiUpdate::PowerPercentage { text, .. } => info!(target: "rover::ui", "power {}", text),
            UiUpdate::HistoryRow(e) => debug!(
                target: "rover::ui",
                "history {} {:.2} V {:.2} mV {:.2} V {:.2} mA {:.2} mW",
                e.timestamp, e.bus_voltage, e.shunt_voltage, e.load_voltage, e.current, e.power
            ),
            UiUpdate::ControlsEnabled(on) => info!(target: "rover::ui", "manual controls {}", if *on { "enabled" } else { "locked" }),
            UiUpdate::ModeLabel(l) => info!(target: "rover::ui", "auto button: {}", l),
            UiUpdate::LaserStatus(s) => info!(target: "rover::ui", "{}", s),
            UiUpdate::Slider(a) => trace!(target: "rover::ui", "slider {}", a),
            UiUpdate::VehicleStatus(s) => info!(
                target: "rover::ui",
                "vehicle camera={} gps={} accel={} imu={} speed={}",
                s.camera, s.gps, s.accelerometer, s.imu, s.speed
            ),
        }
    }
}
