//! Rest timer - stopwatch or countdown driven by one-second ticks
//!
//! States: Idle -> Running <-> Paused, Running -> Finished, anything -> Idle
//! on reset. At most one tick stream is live at a time; leaving Running
//! cancels it before the state changes.

pub mod scheduler;

pub use scheduler::{Scheduler, TickId, TokioScheduler};

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::alerts::{Alerts, BannerPhase};

const FINISHED_TITLE: &str = "⏱️ Timer finished!";

/// Format seconds as `M:SS`, or `H:MM:SS` from one hour up
pub fn format_time(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}", minutes, seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Colour band for the remaining rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestUrgency {
    Calm,
    Warning,
    Critical,
}

/// Result of feeding a tick to the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale or unexpected tick, nothing changed
    Ignored,
    Ticked(u64),
    Finished(u64),
}

/// Snapshot handed to the persistence side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub elapsed: u64,
    pub running: bool,
    pub finished: bool,
    pub target: Option<u64>,
}

type Observer = Box<dyn FnMut(u64)>;

pub struct TimerEngine {
    elapsed: u64,
    running: bool,
    finished: bool,
    target: Option<u64>,
    active_tick: Option<TickId>,
    next_tick: u64,
    scheduler: Box<dyn Scheduler>,
    alerts: Alerts,
    tick_observer: Option<Observer>,
    complete_observer: Option<Observer>,
}

impl TimerEngine {
    pub fn new(scheduler: Box<dyn Scheduler>, alerts: Alerts) -> Self {
        Self {
            elapsed: 0,
            running: false,
            finished: false,
            target: None,
            active_tick: None,
            next_tick: 0,
            scheduler,
            alerts,
            tick_observer: None,
            complete_observer: None,
        }
    }

    /// One-time setup: asks for notification permission if undecided
    pub fn init(&mut self) {
        self.alerts.request_permission();
        info!("Timer initialised");
    }

    pub fn on_tick_observer(&mut self, observer: impl FnMut(u64) + 'static) {
        self.tick_observer = Some(Box::new(observer));
    }

    pub fn on_complete_observer(&mut self, observer: impl FnMut(u64) + 'static) {
        self.complete_observer = Some(Box::new(observer));
    }

    /// Start or resume. `Some(secs)` sets a countdown goal, `None` keeps the
    /// current one. No-op while running. Resuming a finished countdown
    /// without a new goal carries on as a stopwatch.
    pub fn start(&mut self, target: Option<u64>) {
        if self.running {
            return;
        }

        if target.is_some() {
            self.target = target.filter(|t| *t > 0);
        } else if self.finished {
            self.target = None;
        }
        self.running = true;
        self.finished = false;

        let id = TickId(self.next_tick);
        self.next_tick += 1;
        self.scheduler.schedule(id);
        self.active_tick = Some(id);

        debug!("Timer started at {}s (target {:?})", self.elapsed, self.target);
    }

    pub fn pause(&mut self) {
        if !self.running {
            return;
        }
        self.cancel_tick();
        self.running = false;
        debug!("Timer paused at {}s", self.elapsed);
    }

    pub fn toggle(&mut self) {
        if self.running {
            self.pause();
        } else {
            self.start(None);
        }
    }

    pub fn reset(&mut self) {
        self.cancel_tick();
        self.running = false;
        self.elapsed = 0;
        self.target = None;
        self.finished = false;
        debug!("Timer reset");
    }

    /// Finish now and fire the alerts. Repeated calls do nothing.
    pub fn complete(&mut self) {
        if self.finished {
            return;
        }
        self.cancel_tick();
        self.running = false;
        self.finished = true;

        let body = format!("Elapsed: {}", format_time(self.elapsed));
        self.alerts.fire(FINISHED_TITLE, &body, Instant::now());

        if let Some(observer) = self.complete_observer.as_mut() {
            observer(self.elapsed);
        }
        info!("Timer finished after {}", format_time(self.elapsed));
    }

    /// Advance by one second if `id` is the live tick stream
    pub fn on_tick(&mut self, id: TickId) -> TickOutcome {
        if !self.running || self.active_tick != Some(id) {
            debug!("Dropping stale tick {:?}", id);
            return TickOutcome::Ignored;
        }

        self.elapsed += 1;
        if let Some(observer) = self.tick_observer.as_mut() {
            observer(self.elapsed);
        }

        match self.target {
            Some(target) if self.elapsed >= target => {
                self.complete();
                TickOutcome::Finished(self.elapsed)
            }
            _ => TickOutcome::Ticked(self.elapsed),
        }
    }

    pub fn state(&self) -> TimerSnapshot {
        TimerSnapshot {
            elapsed: self.elapsed,
            running: self.running,
            finished: self.finished,
            target: self.target,
        }
    }

    /// Restart from a known elapsed value
    pub fn set_state(&mut self, elapsed: u64, running: bool) {
        self.reset();
        self.elapsed = elapsed;
        if running {
            self.start(None);
        }
    }

    /// Restore a full snapshot, countdown goal included
    pub fn restore(&mut self, snapshot: &TimerSnapshot) {
        self.reset();
        self.elapsed = snapshot.elapsed;
        self.target = snapshot.target.filter(|t| *t > 0);
        if snapshot.finished {
            self.finished = true;
        } else if snapshot.running {
            self.start(None);
        }
    }

    pub fn phase(&self) -> TimerPhase {
        if self.finished {
            TimerPhase::Finished
        } else if self.running {
            TimerPhase::Running
        } else if self.elapsed > 0 {
            TimerPhase::Paused
        } else {
            TimerPhase::Idle
        }
    }

    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn target(&self) -> Option<u64> {
        self.target
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Seconds left in countdown mode
    pub fn remaining(&self) -> Option<u64> {
        self.target.map(|t| t.saturating_sub(self.elapsed))
    }

    /// Remaining time for a countdown, elapsed time for a stopwatch
    pub fn display_text(&self) -> String {
        format_time(self.remaining().unwrap_or(self.elapsed))
    }

    pub fn urgency(&self) -> RestUrgency {
        match self.remaining() {
            Some(r) if r <= 10 => RestUrgency::Critical,
            Some(r) if r <= 30 => RestUrgency::Warning,
            _ => RestUrgency::Calm,
        }
    }

    pub fn banner(&self, now: Instant) -> Option<(&str, BannerPhase)> {
        self.alerts.banner(now)
    }

    pub fn sweep_banner(&mut self, now: Instant) {
        self.alerts.sweep(now);
    }

    fn cancel_tick(&mut self) {
        if let Some(id) = self.active_tick.take() {
            self.scheduler.cancel(id);
        }
    }
}

impl Drop for TimerEngine {
    fn drop(&mut self) {
        self.cancel_tick();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    use super::*;
    use crate::alerts::Permission;
    use crate::alerts::testing::{SharedLog, recording_alerts};

    #[derive(Default)]
    pub struct ScheduleLog {
        pub active: HashSet<TickId>,
        pub scheduled: usize,
    }

    /// Scheduler that only records; tests drive ticks by hand
    pub struct RecordingScheduler {
        pub log: Rc<RefCell<ScheduleLog>>,
    }

    impl Scheduler for RecordingScheduler {
        fn schedule(&mut self, id: TickId) {
            let mut log = self.log.borrow_mut();
            log.active.insert(id);
            log.scheduled += 1;
        }

        fn cancel(&mut self, id: TickId) {
            self.log.borrow_mut().active.remove(&id);
        }
    }

    pub struct TestTimer {
        pub engine: TimerEngine,
        pub schedule: Rc<RefCell<ScheduleLog>>,
        pub alerts: SharedLog,
    }

    /// Initialised engine wired to recording scheduler and alerts
    pub fn recording_engine() -> (TimerEngine, Rc<RefCell<ScheduleLog>>, SharedLog) {
        let schedule = Rc::new(RefCell::new(ScheduleLog::default()));
        let (alerts, alert_log) = recording_alerts(Permission::Default, Permission::Granted);
        let mut engine = TimerEngine::new(
            Box::new(RecordingScheduler {
                log: schedule.clone(),
            }),
            alerts,
        );
        engine.init();
        (engine, schedule, alert_log)
    }

    impl TestTimer {
        pub fn new() -> Self {
            let (engine, schedule, alerts) = recording_engine();
            Self {
                engine,
                schedule,
                alerts,
            }
        }

        /// Deliver one tick from every live stream
        pub fn tick(&mut self) -> Vec<TickOutcome> {
            let ids: Vec<TickId> = self.schedule.borrow().active.iter().copied().collect();
            ids.into_iter().map(|id| self.engine.on_tick(id)).collect()
        }

        pub fn active_streams(&self) -> usize {
            self.schedule.borrow().active.len()
        }
    }
}
