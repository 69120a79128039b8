use std::pin::Pin;

use anyhow::Result;
use rover_control::{doctor, Console, Event, Output, Presenter, TimerRequest};
use rover_link::SerialLink;
use rover_proto::OperatorCommand;
use time::UtcOffset;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, info, warn};

use crate::config::Config;

/// Sweep and interlock timers. The console decides when they run; this only
/// turns its requests into tokio timers.
#[derive(Default)]
struct Timers {
    sweep: Option<Interval>,
    interlock: Option<Pin<Box<Sleep>>>,
}

impl Timers {
    fn apply(&mut self, req: TimerRequest) {
        match req {
            TimerRequest::StartSweep(period) => {
                let mut i = interval_at(Instant::now() + period, period);
                i.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.sweep = Some(i);
            }
            TimerRequest::StopSweep => self.sweep = None,
            TimerRequest::ArmInterlock(after) => self.interlock = Some(Box::pin(tokio::time::sleep(after))),
            TimerRequest::StopInterlock => self.interlock = None,
        }
    }

    fn stop_all(&mut self) {
        self.sweep = None;
        self.interlock = None;
    }
}

async fn sweep_tick(sweep: &mut Option<Interval>) {
    match sweep {
        Some(i) => {
            i.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn interlock_expired(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(s) => s.as_mut().await,
        None => std::future::pending().await,
    }
}

enum Wake {
    Radar(Vec<String>),
    Battery(Vec<String>),
    Drive(Vec<String>),
    SweepTick,
    InterlockTimeout,
    Operator(std::io::Result<Option<String>>),
    Shutdown,
}

/// Console context plus the links and timers around it. Every event is
/// handled to completion before the next one is taken.
pub struct Runtime<P> {
    console: Console,
    radar: SerialLink,
    battery: SerialLink,
    drive: SerialLink,
    timers: Timers,
    presenter: P,
}

impl<P: Presenter> Runtime<P> {
    /// Refuses control and history settings the timers or gauge cannot run
    /// with before any link is opened.
    pub fn new(cfg: &Config, utc_offset: UtcOffset, presenter: P) -> Result<Self> {
        doctor::check_control(&cfg.control)?;
        doctor::check_history(&cfg.history)?;

        Ok(Self {
            console: Console::new(cfg.control.clone(), cfg.history.clone()).with_utc_offset(utc_offset),
            radar: SerialLink::open("radar", cfg.radar.as_ref()),
            battery: SerialLink::open("battery", cfg.battery.as_ref()),
            drive: SerialLink::open("drive", cfg.drive.as_ref()),
            timers: Timers::default(),
            presenter,
        })
    }

    pub async fn run(mut self) -> Result<()> {
        info!(
            radar = self.radar.is_open(),
            battery = self.battery.is_open(),
            drive = self.drive.is_open(),
            "console running (commands: auto, angle <n>, preset <n>, forward, backward, left, right, clear, status, quit)"
        );

        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            let wake = tokio::select! {
                lines = self.radar.next_lines() => Wake::Radar(lines),
                lines = self.battery.next_lines() => Wake::Battery(lines),
                lines = self.drive.next_lines() => Wake::Drive(lines),
                _ = sweep_tick(&mut self.timers.sweep) => Wake::SweepTick,
                _ = interlock_expired(&mut self.timers.interlock) => Wake::InterlockTimeout,
                line = stdin.next_line(), if stdin_open => Wake::Operator(line),
                _ = &mut ctrl_c => Wake::Shutdown,
            };

            match wake {
                Wake::Radar(lines) => {
                    for line in lines {
                        self.dispatch(Event::RadarLine(line)).await;
                    }
                }
                Wake::Battery(lines) => {
                    for line in lines {
                        self.dispatch(Event::BatteryLine(line)).await;
                    }
                }
                Wake::Drive(lines) => {
                    for line in lines {
                        self.dispatch(Event::DriveLine(line)).await;
                    }
                }
                Wake::SweepTick => self.dispatch(Event::SweepTick).await,
                Wake::InterlockTimeout => {
                    // fired; the console re-arms it if still needed
                    self.timers.interlock = None;
                    self.dispatch(Event::InterlockTimeout).await;
                }
                Wake::Operator(Ok(Some(line))) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match line.parse::<OperatorCommand>() {
                        Ok(OperatorCommand::Quit) => break,
                        Ok(cmd) => self.dispatch(Event::Operator(cmd)).await,
                        Err(e) => warn!("operator: {}", e),
                    }
                }
                Wake::Operator(Ok(None)) => {
                    debug!("stdin closed, operator input disabled");
                    stdin_open = false;
                }
                Wake::Operator(Err(e)) => {
                    warn!("stdin read failed: {}", e);
                    stdin_open = false;
                }
                Wake::Shutdown => {
                    info!("interrupt received");
                    break;
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    async fn dispatch(&mut self, event: Event) {
        let out = self.console.handle(event);
        self.apply(out).await;
    }

    async fn apply(&mut self, out: Output) {
        for req in out.timers {
            self.timers.apply(req);
        }
        for update in &out.ui {
            self.presenter.apply(update);
        }
        for cmd in out.commands {
            self.radar.send(&cmd.encode()).await;
        }
        for cmd in out.drive {
            self.drive.send(&cmd.encode()).await;
        }
    }

    fn shutdown(&mut self) {
        self.timers.stop_all();
        self.radar.close();
        self.battery.close();
        self.drive.close();
        info!(snapshot = ?self.console.snapshot(), "console stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rover_control::{ControlConfig, HistoryConfig, LogPresenter};
    use std::time::Duration;

    fn config(control: ControlConfig) -> Config {
        Config { radar: None, battery: None, drive: None, control, history: HistoryConfig::default() }
    }

    #[test]
    fn zero_sweep_interval_is_rejected_before_running() {
        let cfg = config(ControlConfig { sweep_interval_ms: 0, ..ControlConfig::default() });
        assert!(Runtime::new(&cfg, UtcOffset::UTC, LogPresenter).is_err());

        let cfg = config(ControlConfig { interlock_timeout_ms: 0, ..ControlConfig::default() });
        assert!(Runtime::new(&cfg, UtcOffset::UTC, LogPresenter).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn valid_config_toggles_auto_without_links() {
        let cfg = config(ControlConfig::default());
        let mut rt = Runtime::new(&cfg, UtcOffset::UTC, LogPresenter).expect("defaults are valid");
        rt.dispatch(Event::Operator(OperatorCommand::ToggleAuto)).await;
        assert!(rt.timers.sweep.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_timer_starts_and_stops() {
        let mut t = Timers::default();
        t.apply(TimerRequest::StartSweep(Duration::from_millis(50)));
        tokio::time::timeout(Duration::from_millis(60), sweep_tick(&mut t.sweep))
            .await
            .expect("tick within one period");

        t.apply(TimerRequest::StopSweep);
        assert!(t.sweep.is_none());
        let res = tokio::time::timeout(Duration::from_millis(200), sweep_tick(&mut t.sweep)).await;
        assert!(res.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn interlock_rearm_pushes_deadline_out() {
        let mut t = Timers::default();
        t.apply(TimerRequest::ArmInterlock(Duration::from_millis(2000)));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        t.apply(TimerRequest::ArmInterlock(Duration::from_millis(2000)));

        let early = tokio::time::timeout(Duration::from_millis(1000), interlock_expired(&mut t.interlock)).await;
        assert!(early.is_err());
        let late = tokio::time::timeout(Duration::from_millis(1100), interlock_expired(&mut t.interlock)).await;
        assert!(late.is_ok());
    }
}
