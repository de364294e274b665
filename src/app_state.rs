//! Application state shared by the display surface and the input handlers

use chrono::Utc;
use tracing::{info, warn};

use crate::completion::{CompletionState, CompletionStore};
use crate::db::RestRecord;
use crate::render::{WorkoutView, render_day};
use crate::timer::{TickId, TickOutcome, TimerEngine};
use crate::workout::{Program, WorkoutDay, block_for_week, tempo_for_block};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Workout,
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start,
    Pause,
    Toggle,
    Reset,
}

/// Everything the display surface can ask for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    SetToggle {
        exercise_id: String,
        set_number: u32,
    },
    Timer(TimerAction),
    ChangeWeek(i32),
    ChangeDay(i32),
    SelectTab(Tab),
}

pub struct AppState {
    pub program: Program,
    pub completion: CompletionState,
    pub timer: TimerEngine,
    week: u32,
    day: usize,
    tab: Tab,
    /// Exercise whose rest the timer is counting
    rest_for: Option<String>,
}

impl AppState {
    pub fn new(program: Program, timer: TimerEngine) -> Self {
        Self {
            program,
            completion: CompletionState::new(),
            timer,
            week: 1,
            day: 0,
            tab: Tab::Workout,
            rest_for: None,
        }
    }

    /// Apply one input. Returns false when the event was rejected.
    pub fn handle(&mut self, event: InputEvent) -> bool {
        match event {
            InputEvent::SetToggle { exercise_id, set_number } => {
                self.toggle_set(&exercise_id, set_number)
            }
            InputEvent::Timer(action) => {
                self.timer_action(action);
                true
            }
            InputEvent::ChangeWeek(delta) => self.change_week(delta),
            InputEvent::ChangeDay(delta) => self.change_day(delta),
            InputEvent::SelectTab(tab) => {
                self.tab = tab;
                true
            }
        }
    }

    fn toggle_set(&mut self, exercise_id: &str, set_number: u32) -> bool {
        let Some(exercise) = self.current_day().and_then(|d| d.find_exercise(exercise_id)) else {
            warn!("Unknown exercise {}", exercise_id);
            return false;
        };
        if set_number == 0 || set_number > exercise.sets {
            warn!("Set {} out of range for {} ({} sets)", set_number, exercise_id, exercise.sets);
            return false;
        }
        let rest = exercise.rest_secs();

        let completed = self.completion.toggle(exercise_id, set_number);
        info!(
            "Set {} of {} {}",
            set_number,
            exercise_id,
            if completed { "done" } else { "undone" }
        );

        if completed && let Some(rest) = rest {
            self.timer.reset();
            self.timer.start(Some(u64::from(rest)));
            self.rest_for = Some(exercise_id.to_string());
        }
        true
    }

    fn timer_action(&mut self, action: TimerAction) {
        match action {
            TimerAction::Start => self.timer.start(None),
            TimerAction::Pause => self.timer.pause(),
            TimerAction::Toggle => self.timer.toggle(),
            TimerAction::Reset => {
                self.timer.reset();
                self.rest_for = None;
            }
        }
    }

    /// Move by `delta` weeks, rejected outside the program
    pub fn change_week(&mut self, delta: i32) -> bool {
        let new_week = i64::from(self.week) + i64::from(delta);
        if new_week < 1 || new_week > i64::from(self.program.max_weeks) {
            info!("Week {} out of range", new_week);
            return false;
        }
        self.week = new_week as u32;
        info!("Week {}", self.week);
        true
    }

    /// Move by `delta` days, wrapping around the week
    pub fn change_day(&mut self, delta: i32) -> bool {
        let days = self.program.days.len() as i64;
        if days == 0 {
            return false;
        }
        self.day = (self.day as i64 + i64::from(delta)).rem_euclid(days) as usize;
        true
    }

    pub fn on_tick(&mut self, id: TickId) -> TickOutcome {
        self.timer.on_tick(id)
    }

    /// Log entry for a rest that just finished
    pub fn finished_rest(&self, elapsed: u64) -> RestRecord {
        RestRecord {
            id: None,
            completed_at: Utc::now(),
            exercise_id: self.rest_for.clone(),
            target_secs: self.timer.target(),
            elapsed_secs: elapsed,
        }
    }

    pub fn current_day(&self) -> Option<&WorkoutDay> {
        self.program.day(self.day)
    }

    pub fn view(&self) -> WorkoutView {
        render_day(self.current_day(), &self.completion)
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn day_index(&self) -> usize {
        self.day
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn rest_for(&self) -> Option<&str> {
        self.rest_for.as_deref()
    }

    pub fn week_label(&self) -> String {
        let block = block_for_week(self.week);
        format!(
            "Week {}/{} • Block {} • Tempo {}",
            self.week,
            self.program.max_weeks,
            block,
            tempo_for_block(block)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::timer::testing::{ScheduleLog, recording_engine};
    use crate::timer::TimerPhase;
    use crate::workout::Program;

    fn create_state() -> (AppState, Rc<RefCell<ScheduleLog>>) {
        let (engine, schedule, _alerts) = recording_engine();
        (AppState::new(Program::demo(), engine), schedule)
    }

    fn active_streams(schedule: &Rc<RefCell<ScheduleLog>>) -> usize {
        schedule.borrow().active.len()
    }

    fn toggle(exercise_id: &str, set_number: u32) -> InputEvent {
        InputEvent::SetToggle {
            exercise_id: exercise_id.to_string(),
            set_number,
        }
    }

    #[test]
    fn test_completing_set_starts_rest_countdown() {
        let (mut state, _h) = create_state();
        assert!(state.handle(toggle("squat", 1)));

        assert!(state.completion.is_completed("squat", 1));
        assert_eq!(state.timer.phase(), TimerPhase::Running);
        assert_eq!(state.timer.target(), Some(75));
        assert_eq!(state.rest_for(), Some("squat"));
    }

    #[test]
    fn test_uncompleting_set_leaves_timer() {
        let (mut state, _h) = create_state();
        state.handle(toggle("squat", 1));
        state.handle(InputEvent::Timer(TimerAction::Pause));
        state.handle(toggle("squat", 1));

        assert!(!state.completion.is_completed("squat", 1));
        assert_eq!(state.timer.target(), Some(75));
        assert!(!state.timer.is_running());
    }

    #[test]
    fn test_new_set_restarts_rest() {
        let (mut state, h) = create_state();
        state.handle(toggle("squat", 1));
        state.handle(toggle("rdl", 1));
        assert_eq!(state.timer.target(), Some(60));
        assert_eq!(state.timer.elapsed(), 0);
        assert_eq!(state.rest_for(), Some("rdl"));
        assert_eq!(active_streams(&h), 1);
    }

    #[test]
    fn test_unknown_exercise_is_noop() {
        let (mut state, _h) = create_state();
        assert!(!state.handle(toggle("bench", 1)));
        assert_eq!(state.completion.total_completed(), 0);
        assert_eq!(state.timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_set_out_of_range_is_rejected() {
        let (mut state, _h) = create_state();
        assert!(!state.handle(toggle("squat", 5)));
        assert!(!state.handle(toggle("squat", 0)));
        assert_eq!(state.completion.total_completed(), 0);
    }

    #[test]
    fn test_week_clamped() {
        let (mut state, _h) = create_state();
        assert!(!state.handle(InputEvent::ChangeWeek(-1)));
        assert_eq!(state.week(), 1);

        assert!(state.handle(InputEvent::ChangeWeek(25)));
        assert_eq!(state.week(), 26);
        assert!(!state.handle(InputEvent::ChangeWeek(1)));
        assert_eq!(state.week(), 26);
    }

    #[test]
    fn test_week_label() {
        let (mut state, _h) = create_state();
        assert_eq!(state.week_label(), "Week 1/26 • Block 1 • Tempo 3-1-2");
        state.change_week(4);
        assert_eq!(state.week_label(), "Week 5/26 • Block 2 • Tempo 2-0-2");
    }

    #[test]
    fn test_day_wraps() {
        let (mut state, _h) = create_state();
        let days = state.program.days.len();
        state.handle(InputEvent::ChangeDay(-1));
        assert_eq!(state.day_index(), days - 1);
        state.handle(InputEvent::ChangeDay(1));
        assert_eq!(state.day_index(), 0);
    }

    #[test]
    fn test_rest_day_view() {
        let (mut state, _h) = create_state();
        state.handle(InputEvent::ChangeDay(2));
        assert_eq!(state.view(), WorkoutView::RestDay);
    }

    #[test]
    fn test_view_reflects_completion() {
        let (mut state, _h) = create_state();
        state.handle(toggle("legpress", 2));
        let view = state.view();
        let card = view.cards().iter().find(|c| c.exercise_id == "legpress").unwrap();
        assert!(card.sets[1].completed);
        assert!(!card.sets[0].completed);
    }

    #[test]
    fn test_reset_action_forgets_rest() {
        let (mut state, _h) = create_state();
        state.handle(toggle("squat", 1));
        state.handle(InputEvent::Timer(TimerAction::Reset));
        assert_eq!(state.rest_for(), None);
        assert_eq!(state.timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_finished_rest_record() {
        let (mut state, _h) = create_state();
        state.handle(toggle("squat", 1));
        let record = state.finished_rest(75);
        assert_eq!(record.exercise_id.as_deref(), Some("squat"));
        assert_eq!(record.target_secs, Some(75));
        assert_eq!(record.elapsed_secs, 75);
    }

    #[test]
    fn test_select_tab() {
        let (mut state, _h) = create_state();
        state.handle(InputEvent::SelectTab(Tab::Stats));
        assert_eq!(state.tab(), Tab::Stats);
    }
}
