use std::time::Duration;

use rover_proto::{servo_angle, Command, RadarSample};
use serde::Serialize;
use tracing::{debug, info};

use crate::console::Output;
use crate::presenter::UiUpdate;
use crate::ControlConfig;

pub const LABEL_START_AUTO: &str = "Start Auto";
pub const LABEL_STOP_AUTO: &str = "Stop Auto";
pub const LASER_STATUS_ON: &str = "Laser: On";
pub const LASER_STATUS_OFF: &str = "Laser: Off";

const SWEEP_MIN: i32 = 0;
const SWEEP_MAX: i32 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Mode {
    Manual,
    AutoSweep,
}

impl Mode {
    fn label(self) -> &'static str {
        match self {
            Mode::Manual => LABEL_START_AUTO,
            Mode::AutoSweep => LABEL_STOP_AUTO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Interlock {
    Idle,
    LaserActive { saved_mode: Mode, saved_controls_enabled: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SweepDirection {
    Increasing,
    Decreasing,
}

/// Timer changes the runtime has to apply after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerRequest {
    StartSweep(Duration),
    StopSweep,
    ArmInterlock(Duration),
    StopInterlock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlState {
    pub mode: Mode,
    pub interlock: Interlock,
    /// Whether the manual angle controls are enabled on the console.
    pub controls_enabled: bool,
    pub sweep_angle: i32,
    pub sweep_direction: SweepDirection,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            mode: Mode::Manual,
            interlock: Interlock::Idle,
            controls_enabled: true,
            sweep_angle: SWEEP_MIN,
            sweep_direction: SweepDirection::Increasing,
        }
    }
}

impl ControlState {
    pub fn laser_active(&self) -> bool {
        matches!(self.interlock, Interlock::LaserActive { .. })
    }
}

/// Mode and laser interlock logic. Every method is a complete transition:
/// it mutates the state and records the resulting commands, timer changes
/// and display updates in `out`.
#[derive(Debug, Clone)]
pub struct ControlStateMachine {
    cfg: ControlConfig,
    state: ControlState,
}

impl ControlStateMachine {
    pub fn new(cfg: ControlConfig) -> Self {
        Self { cfg, state: ControlState::default() }
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn on_radar(&mut self, sample: &RadarSample, out: &mut Output) {
        if sample.distance < self.cfg.laser_trigger_distance_cm && !self.state.laser_active() {
            info!(distance = sample.distance, angle = sample.angle, "target inside laser range");
            self.engage_laser(out);
        }
    }

    pub fn engage_laser(&mut self, out: &mut Output) {
        if let Interlock::LaserActive { .. } = self.state.interlock {
            // Already engaged: keep the saved pre-interlock state.
            debug!("laser engage while active, re-arming interlock");
            out.send(Command::LaserOn);
            out.timer(TimerRequest::ArmInterlock(self.cfg.interlock_timeout()));
            return;
        }

        self.state.interlock = Interlock::LaserActive {
            saved_mode: self.state.mode,
            saved_controls_enabled: self.state.controls_enabled,
        };

        if self.state.mode == Mode::AutoSweep {
            out.timer(TimerRequest::StopSweep);
            self.state.mode = Mode::Manual;
            out.ui(UiUpdate::ModeLabel(Mode::Manual.label()));
        }

        self.state.controls_enabled = false;
        out.ui(UiUpdate::ControlsEnabled(false));
        out.ui(UiUpdate::LaserStatus(LASER_STATUS_ON));
        out.send(Command::LaserOn);
        out.timer(TimerRequest::ArmInterlock(self.cfg.interlock_timeout()));
        info!(saved = ?self.state.interlock, "laser interlock engaged");
    }

    pub fn disengage_laser(&mut self, out: &mut Output) {
        let (mode, controls_enabled) = match self.state.interlock {
            Interlock::LaserActive { saved_mode, saved_controls_enabled } => {
                (saved_mode, saved_controls_enabled)
            }
            Interlock::Idle => (self.state.mode, self.state.controls_enabled),
        };
        let was_active = self.state.laser_active();

        self.state.interlock = Interlock::Idle;
        out.timer(TimerRequest::StopInterlock);
        out.ui(UiUpdate::LaserStatus(LASER_STATUS_OFF));
        out.send(Command::LaserOff);

        match mode {
            Mode::AutoSweep => {
                if self.state.mode != Mode::AutoSweep {
                    out.timer(TimerRequest::StartSweep(self.cfg.sweep_interval()));
                }
                out.send(Command::Auto);
            }
            Mode::Manual => out.send(Command::Manual),
        }
        self.state.mode = mode;
        self.state.controls_enabled = controls_enabled;
        out.ui(UiUpdate::ControlsEnabled(controls_enabled));
        out.ui(UiUpdate::ModeLabel(mode.label()));

        if was_active {
            info!(mode = ?mode, "laser interlock released");
        }
    }

    /// Operator-requested servo angle. Returns false when the request is
    /// refused because the console is sweeping or the laser is engaged.
    pub fn manual_angle(&mut self, deg: i32, out: &mut Output) -> bool {
        if self.state.mode != Mode::Manual || self.state.laser_active() {
            debug!(deg, mode = ?self.state.mode, laser = self.state.laser_active(), "manual angle ignored");
            return false;
        }
        let a = servo_angle(deg);
        out.ui(UiUpdate::Slider(a));
        out.send(Command::Angle(a));
        true
    }

    pub fn toggle_auto(&mut self, out: &mut Output) {
        if self.state.laser_active() {
            debug!("auto toggle ignored while laser is engaged");
            return;
        }

        match self.state.mode {
            Mode::Manual => {
                self.state.mode = Mode::AutoSweep;
                self.state.controls_enabled = false;
                out.timer(TimerRequest::StartSweep(self.cfg.sweep_interval()));
                out.ui(UiUpdate::ModeLabel(LABEL_STOP_AUTO));
                out.ui(UiUpdate::ControlsEnabled(false));
                out.send(Command::Auto);
            }
            Mode::AutoSweep => {
                self.state.mode = Mode::Manual;
                self.state.controls_enabled = true;
                out.timer(TimerRequest::StopSweep);
                out.ui(UiUpdate::ModeLabel(LABEL_START_AUTO));
                out.ui(UiUpdate::ControlsEnabled(true));
                out.send(Command::Manual);
            }
        }
        info!(mode = ?self.state.mode, "mode toggled");
    }

    pub fn sweep_tick(&mut self, out: &mut Output) {
        if self.state.mode != Mode::AutoSweep {
            // stale tick from a timer that was just stopped
            return;
        }

        let step = self.cfg.sweep_step_deg as i32;
        let s = &mut self.state;
        match s.sweep_direction {
            SweepDirection::Increasing => {
                s.sweep_angle += step;
                if s.sweep_angle >= SWEEP_MAX {
                    s.sweep_angle = SWEEP_MAX;
                    s.sweep_direction = SweepDirection::Decreasing;
                }
            }
            SweepDirection::Decreasing => {
                s.sweep_angle -= step;
                if s.sweep_angle <= SWEEP_MIN {
                    s.sweep_angle = SWEEP_MIN;
                    s.sweep_direction = SweepDirection::Increasing;
                }
            }
        }

        let a = servo_angle(s.sweep_angle);
        out.ui(UiUpdate::Slider(a));
        out.send(Command::Angle(a));
    }

    /// The interlock timer never releases the laser; while engaged it
    /// re-asserts `LASER_ON` and re-arms itself.
    pub fn interlock_timeout(&mut self, out: &mut Output) {
        if !self.state.laser_active() {
            return;
        }
        out.send(Command::LaserOn);
        out.timer(TimerRequest::ArmInterlock(self.cfg.interlock_timeout()));
    }
}
