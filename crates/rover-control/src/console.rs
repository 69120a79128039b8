use rover_proto::message::{decode_battery, decode_vehicle_status};
use rover_proto::{decode, BatterySample, Command, DriveCommand, LaserEvent, Message, OperatorCommand, RadarSample};
use serde::Serialize;
use time::{OffsetDateTime, UtcOffset};
use tracing::{debug, info, trace};

use crate::geometry::NeedleGeometry;
use crate::history::{BatteryHistory, DetectionHistory, DetectionPoint, HistoryEntry};
use crate::presenter::UiUpdate;
use crate::state::{ControlState, ControlStateMachine, TimerRequest};
use crate::{ControlConfig, HistoryConfig};

/// Everything the console reacts to, funnelled through [`Console::handle`].
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Framed line from the radar/laser controller.
    RadarLine(String),
    /// Framed line from the dedicated battery monitor.
    BatteryLine(String),
    /// Framed line from the drive controller.
    DriveLine(String),
    SweepTick,
    InterlockTimeout,
    Operator(OperatorCommand),
}

/// Side effects of one event, in the order they were produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Output {
    /// For the radar/laser link.
    pub commands: Vec<Command>,
    /// For the drive link.
    pub drive: Vec<DriveCommand>,
    pub timers: Vec<TimerRequest>,
    pub ui: Vec<UiUpdate>,
}

impl Output {
    pub fn send(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn timer(&mut self, req: TimerRequest) {
        self.timers.push(req);
    }

    pub fn ui(&mut self, update: UiUpdate) {
        self.ui.push(update);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.drive.is_empty() && self.timers.is_empty() && self.ui.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub control: ControlState,
    pub detections: usize,
    pub latest_detection: Option<DetectionPoint>,
    pub battery_rows: Vec<HistoryEntry>,
}

/// Console context: control state plus the detection and battery histories.
/// Built once at startup; events are handled one at a time.
pub struct Console {
    machine: ControlStateMachine,
    detections: DetectionHistory,
    battery: BatteryHistory,
    needle: NeedleGeometry,
    max_expected_power: f32,
    utc_offset: UtcOffset,
}

impl Console {
    pub fn new(control: ControlConfig, history: HistoryConfig) -> Self {
        Self {
            machine: ControlStateMachine::new(control),
            detections: DetectionHistory::new(history.detection_capacity),
            battery: BatteryHistory::new(history.battery_window),
            needle: NeedleGeometry::default(),
            max_expected_power: history.max_expected_power_mw,
            utc_offset: UtcOffset::UTC,
        }
    }

    /// Offset used for battery history timestamps.
    pub fn with_utc_offset(mut self, offset: UtcOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn state(&self) -> &ControlState {
        self.machine.state()
    }

    pub fn detections(&self) -> &DetectionHistory {
        &self.detections
    }

    pub fn battery_history(&self) -> &BatteryHistory {
        &self.battery
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            control: self.machine.state().clone(),
            detections: self.detections.len(),
            latest_detection: self.detections.latest().copied(),
            battery_rows: self.battery.slots().cloned().collect(),
        }
    }

    pub fn handle(&mut self, event: Event) -> Output {
        let now = OffsetDateTime::now_utc().to_offset(self.utc_offset);
        self.handle_at(event, now)
    }

    pub fn handle_at(&mut self, event: Event, now: OffsetDateTime) -> Output {
        let mut out = Output::default();
        match event {
            Event::RadarLine(line) => match decode(&line) {
                Message::Radar(s) => self.on_radar(s, &mut out),
                Message::Battery(b) => self.on_battery(b, now, &mut out),
                Message::Laser(LaserEvent::Activated) => self.machine.engage_laser(&mut out),
                Message::Laser(LaserEvent::Deactivated) => self.machine.disengage_laser(&mut out),
                Message::Unknown => trace!(line = %line, "ignoring radar line"),
            },
            Event::BatteryLine(line) => match decode_battery(&line) {
                Some(b) => self.on_battery(b, now, &mut out),
                None => trace!(line = %line, "ignoring battery line"),
            },
            Event::DriveLine(line) => match decode_vehicle_status(&line) {
                Some(s) => out.ui(UiUpdate::VehicleStatus(s)),
                None => trace!(line = %line, "ignoring drive line"),
            },
            Event::SweepTick => self.machine.sweep_tick(&mut out),
            Event::InterlockTimeout => self.machine.interlock_timeout(&mut out),
            Event::Operator(cmd) => self.on_operator(cmd, &mut out),
        }
        out
    }

    fn on_radar(&mut self, s: RadarSample, out: &mut Output) {
        debug!(angle = s.angle, distance = s.distance, "radar sample");
        out.ui(UiUpdate::AngleLabel(s.angle));
        out.ui(UiUpdate::RangeLabel(s.distance));

        let point = DetectionPoint::from_polar(s.angle, s.distance);
        out.ui(UiUpdate::DetectionAdded(point));
        out.ui(UiUpdate::Needle(self.needle.polygon(s.angle)));
        if let Some(old) = self.detections.push(point) {
            out.ui(UiUpdate::DetectionEvicted(old));
        }

        self.machine.on_radar(&s, out);
    }

    fn on_battery(&mut self, b: BatterySample, now: OffsetDateTime, out: &mut Output) {
        debug!(power = b.power, current = b.current, "battery sample");
        out.ui(UiUpdate::BatteryLabels(b));

        let percent = power_percent(b.power, self.max_expected_power);
        let text = format!("{}% ({:.1}mW / {:.1}mW)", percent, b.power, self.max_expected_power);
        out.ui(UiUpdate::PowerPercentage { percent, text });

        let entry = HistoryEntry::new(clock_hms(now), &b);
        self.battery.push(entry.clone());
        out.ui(UiUpdate::HistoryRow(entry));
    }

    fn on_operator(&mut self, cmd: OperatorCommand, out: &mut Output) {
        match cmd {
            OperatorCommand::ToggleAuto => self.machine.toggle_auto(out),
            OperatorCommand::Angle(deg) => {
                self.machine.manual_angle(deg, out);
            }
            OperatorCommand::Preset(deg) => {
                self.machine.manual_angle(deg as i32, out);
            }
            OperatorCommand::Drive(d) => out.drive.push(d),
            OperatorCommand::ClearDetections => {
                self.detections.clear();
                out.ui(UiUpdate::DetectionsCleared);
            }
            OperatorCommand::Status => info!(snapshot = ?self.snapshot(), "console status"),
            // handled by the runtime
            OperatorCommand::Quit => {}
        }
    }
}

/// Gauge reading: rounded share of the expected maximum, capped at 100.
pub fn power_percent(power: f32, max_expected: f32) -> u8 {
    if max_expected <= 0.0 {
        return 0;
    }
    (power / max_expected * 100.0).round().clamp(0.0, 100.0) as u8
}

fn clock_hms(t: OffsetDateTime) -> String {
    format!("{:02}:{:02}:{:02}", t.hour(), t.minute(), t.second())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Interlock, Mode};
    use std::time::Duration;
    use time::macros::datetime;

    fn console() -> Console {
        Console::new(ControlConfig::default(), HistoryConfig::default())
    }

    fn at(c: &mut Console, ev: Event) -> Output {
        c.handle_at(ev, datetime!(2024-05-01 14:03:09 UTC))
    }

    fn radar(line: &str) -> Event {
        Event::RadarLine(line.to_string())
    }

    fn wire(out: &Output) -> Vec<u8> {
        out.commands.iter().flat_map(|c| c.encode()).collect()
    }

    #[test]
    fn close_target_writes_exactly_one_laser_on() {
        let mut c = console();
        at(&mut c, Event::Operator(OperatorCommand::ToggleAuto));

        let out = at(&mut c, radar("90,10"));
        assert_eq!(wire(&out), b"LASER_ON\n");
        assert!(c.state().laser_active());
        assert_eq!(c.state().mode, Mode::Manual);
        assert!(!c.state().controls_enabled);
        assert!(out.timers.contains(&TimerRequest::StopSweep));
        // detection is recorded regardless of the interlock
        assert_eq!(c.detections().len(), 1);
    }

    #[test]
    fn deactivation_line_resumes_sweep_in_order() {
        let mut c = console();
        at(&mut c, Event::Operator(OperatorCommand::ToggleAuto));
        at(&mut c, radar("LASER_ACTIVATED"));

        let out = at(&mut c, radar("LASER_DEACTIVATED"));
        assert_eq!(wire(&out), b"LASER_OFF\nAUTO\n");
        assert_eq!(c.state().mode, Mode::AutoSweep);
        assert_eq!(c.state().interlock, Interlock::Idle);
        assert!(out.timers.contains(&TimerRequest::StartSweep(Duration::from_millis(50))));
    }

    #[test]
    fn toggle_during_interlock_changes_nothing() {
        let mut c = console();
        at(&mut c, radar("45,12"));
        let before = c.snapshot();

        let out = at(&mut c, Event::Operator(OperatorCommand::ToggleAuto));
        assert!(out.is_empty());
        assert_eq!(c.snapshot().control, before.control);
    }

    #[test]
    fn radar_sample_updates_labels_and_needle_in_any_mode() {
        let mut c = console();
        at(&mut c, Event::Operator(OperatorCommand::ToggleAuto));
        let out = at(&mut c, radar("30.0,120.0"));

        assert!(out.commands.is_empty());
        assert_eq!(out.ui[0], UiUpdate::AngleLabel(30.0));
        assert_eq!(out.ui[1], UiUpdate::RangeLabel(120.0));
        assert!(out.ui.iter().any(|u| matches!(u, UiUpdate::Needle(_))));
        assert!(out.ui.iter().any(|u| matches!(u, UiUpdate::DetectionAdded(_))));
    }

    #[test]
    fn detection_history_is_capped() {
        let mut c = console();
        let mut evicted = 0;
        for i in 0..60 {
            let out = at(&mut c, radar(&format!("{},100", i)));
            evicted += out.ui.iter().filter(|u| matches!(u, UiUpdate::DetectionEvicted(_))).count();
        }
        assert_eq!(c.detections().len(), 50);
        assert_eq!(evicted, 10);
    }

    #[test]
    fn battery_line_on_radar_link_feeds_history() {
        let mut c = console();
        let out = at(&mut c, radar("B,1,12.00,0.50,11.80,150.25,1800.00"));

        assert_eq!(
            out.ui.iter().find_map(|u| match u {
                UiUpdate::PowerPercentage { percent, text } => Some((*percent, text.clone())),
                _ => None,
            }),
            Some((36, "36% (1800.0mW / 5000.0mW)".to_string()))
        );
        let row = c.battery_history().slots().next().expect("row");
        assert_eq!(row.timestamp, "14:03:09");
        assert_eq!(row.current, 150.25);
    }

    #[test]
    fn both_battery_paths_share_one_history() {
        let mut c = console();
        at(&mut c, radar("B,1,12,0.5,11.8,150,1800"));
        at(&mut c, Event::BatteryLine("BAT,12.4,0.4,12.2,120,1500".into()));
        at(&mut c, Event::BatteryLine("garbage".into()));

        let powers: Vec<f32> = c.battery_history().slots().map(|e| e.power).collect();
        assert_eq!(powers, vec![1500.0, 1800.0]);
    }

    #[test]
    fn power_gauge_caps_at_one_hundred() {
        assert_eq!(power_percent(6000.0, 5000.0), 100);
        assert_eq!(power_percent(2500.0, 5000.0), 50);
        assert_eq!(power_percent(-10.0, 5000.0), 0);
        assert_eq!(power_percent(10.0, 0.0), 0);
    }

    #[test]
    fn unknown_lines_have_no_effect() {
        let mut c = console();
        for line in ["", "hello", "1,2,3", "B,1,2", "LASER"] {
            assert!(at(&mut c, radar(line)).is_empty(), "line {:?}", line);
        }
        assert!(c.detections().is_empty());
        assert!(c.battery_history().is_empty());
    }

    #[test]
    fn presets_and_slider_respect_mode() {
        let mut c = console();
        let out = at(&mut c, Event::Operator(OperatorCommand::Preset(45)));
        assert_eq!(wire(&out), b"45\n");
        let out = at(&mut c, Event::Operator(OperatorCommand::Angle(250)));
        assert_eq!(wire(&out), b"180\n");

        at(&mut c, Event::Operator(OperatorCommand::ToggleAuto));
        let out = at(&mut c, Event::Operator(OperatorCommand::Preset(90)));
        assert!(out.commands.is_empty());
    }

    #[test]
    fn sweep_tick_emits_angle_and_slider() {
        let mut c = console();
        at(&mut c, Event::Operator(OperatorCommand::ToggleAuto));
        let out = at(&mut c, Event::SweepTick);
        assert_eq!(wire(&out), b"2\n");
        assert_eq!(out.ui, vec![UiUpdate::Slider(2)]);
    }

    #[test]
    fn drive_commands_pass_through_even_when_locked() {
        let mut c = console();
        at(&mut c, radar("LASER_ACTIVATED"));
        let out = at(&mut c, Event::Operator(OperatorCommand::Drive(DriveCommand::Left)));
        assert_eq!(out.drive, vec![DriveCommand::Left]);
        assert!(out.commands.is_empty());
    }

    #[test]
    fn drive_status_line_updates_display() {
        let mut c = console();
        let out = at(&mut c, Event::DriveLine("ok,0,fix,0.2,ok,12".into()));
        assert!(matches!(&out.ui[..], [UiUpdate::VehicleStatus(s)] if s.speed == 12));
        assert!(at(&mut c, Event::DriveLine("ok,0".into())).is_empty());
    }

    #[test]
    fn clear_empties_detections() {
        let mut c = console();
        at(&mut c, radar("10,300"));
        let out = at(&mut c, Event::Operator(OperatorCommand::ClearDetections));
        assert_eq!(out.ui, vec![UiUpdate::DetectionsCleared]);
        assert!(c.detections().is_empty());
    }
}
