//! TUI module - Terminal workout view and rest timer with ratatui

use std::io::{Stdout, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::alerts::BannerPhase;
use crate::app_state::{AppState, InputEvent, Tab, TimerAction};
use crate::db::{Database, RestRecord};
use crate::render::{ExerciseCard, SetControl, WorkoutView};
use crate::timer::{RestUrgency, TickId, TickOutcome, TimerPhase, format_time};

type Tui = Terminal<CrosstermBackend<Stdout>>;

const RECENT_RESTS: usize = 50;

/// Key presses that drive the app
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Input(InputEvent),
    SelectNext,
    SelectPrev,
    Quit,
}

/// App state for TUI
pub struct App {
    state: AppState,
    db: Database,
    ticks: UnboundedReceiver<TickId>,
    /// Index into the current day's set controls
    selected: usize,
    rests: Vec<RestRecord>,
    should_quit: bool,
}

impl App {
    pub fn new(state: AppState, db: Database, ticks: UnboundedReceiver<TickId>) -> Result<Self> {
        let rests = db.get_rests(RECENT_RESTS)?;
        Ok(Self {
            state,
            db,
            ticks,
            selected: 0,
            rests,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            self.drain_ticks();
            self.state.timer.sweep_banner(Instant::now());
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;

        self.db.save_snapshot(&self.state.timer.state())?;
        info!("Timer snapshot saved");
        Ok(())
    }

    /// Feed every pending tick to the timer
    fn drain_ticks(&mut self) {
        while let Ok(id) = self.ticks.try_recv() {
            if let TickOutcome::Finished(elapsed) = self.state.on_tick(id) {
                self.record_rest(elapsed);
            }
        }
    }

    fn record_rest(&mut self, elapsed: u64) {
        let rest = self.state.finished_rest(elapsed);
        match self.db.log_rest(&rest) {
            Ok(id) => {
                self.rests.insert(0, RestRecord {
                    id: Some(id),
                    ..rest
                });
                self.rests.truncate(RECENT_RESTS);
            }
            Err(e) => warn!("Failed to log rest: {}", e),
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let day_name = self
            .state
            .current_day()
            .map(|d| d.name.as_str())
            .unwrap_or("-");
        let header = Paragraph::new(format!(
            "{} | {} | {}",
            self.state.program.name,
            self.state.week_label(),
            day_name
        ))
        .style(Style::default().fg(Color::Cyan).bold())
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        match self.state.tab() {
            Tab::Workout => self.render_workout(frame, chunks[1]),
            Tab::Stats => self.render_stats(frame, chunks[1]),
        }

        self.render_timer(frame, chunks[2]);

        // Footer
        let footer = Paragraph::new(concat!(
            "q: quit | space: timer | r: reset | enter: set done | ",
            "j/k: select | h/l: day | [/]: week | 1/2: tabs",
        ))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);

        if let Some((text, phase)) = self.state.timer.banner(Instant::now()) {
            render_banner(frame, area, text, phase);
        }
    }

    fn render_workout(&self, frame: &mut Frame, area: Rect) {
        let view = self.state.view();
        let (lines, selected_line) = workout_lines(&view, self.selected);

        let visible = area.height.saturating_sub(2) as usize;
        let scroll = selected_line
            .map(|l| l.saturating_sub(visible / 2))
            .unwrap_or(0);

        let title = format!("Workout ({} sets done)", self.state.completion.total_completed());
        let body = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false })
            .scroll((scroll as u16, 0));
        frame.render_widget(body, area);
    }

    fn render_stats(&self, frame: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .rests
            .iter()
            .map(|r| {
                Row::new(vec![
                    Cell::from(r.completed_at.format("%Y-%m-%d %H:%M").to_string()),
                    Cell::from(r.exercise_id.clone().unwrap_or_else(|| "-".to_string())),
                    Cell::from(r.target_secs.map(format_time).unwrap_or_else(|| "-".to_string())),
                    Cell::from(format_time(r.elapsed_secs)),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(18),
                Constraint::Min(16),
                Constraint::Length(10),
                Constraint::Length(10),
            ],
        )
        .header(
            Row::new(vec!["Finished", "Exercise", "Target", "Elapsed"])
                .style(Style::default().bold()),
        )
        .block(Block::default().borders(Borders::ALL).title("Rests"));

        frame.render_widget(table, area);
    }

    fn render_timer(&self, frame: &mut Frame, area: Rect) {
        let timer = &self.state.timer;
        let color = match (timer.phase(), timer.urgency()) {
            (TimerPhase::Finished, _) => Color::Red,
            (_, RestUrgency::Critical) => Color::Red,
            (_, RestUrgency::Warning) => Color::Yellow,
            (TimerPhase::Idle, _) => Color::DarkGray,
            _ => Color::Green,
        };
        let phase = match timer.phase() {
            TimerPhase::Idle => "ready",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Finished => "finished",
        };
        let mode = match (timer.target(), self.state.rest_for()) {
            (Some(t), Some(ex)) => format!("rest {} for {}", format_time(t), ex),
            (Some(t), None) => format!("countdown {}", format_time(t)),
            _ => "stopwatch".to_string(),
        };

        let text = Line::from(vec![
            Span::styled(
                format!("⏱️ {}", timer.display_text()),
                Style::default().fg(color).bold(),
            ),
            Span::raw(format!("  {}  ({})", phase, mode)),
        ]);
        let panel =
            Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Timer"));
        frame.render_widget(panel, area);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && let Some(command) = self.map_key(key.code)
        {
            self.apply(command);
        }
        Ok(())
    }

    fn map_key(&self, code: KeyCode) -> Option<Command> {
        let command = match code {
            KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
            KeyCode::Char(' ') => Command::Input(InputEvent::Timer(TimerAction::Toggle)),
            KeyCode::Char('s') => Command::Input(InputEvent::Timer(TimerAction::Start)),
            KeyCode::Char('p') => Command::Input(InputEvent::Timer(TimerAction::Pause)),
            KeyCode::Char('r') => Command::Input(InputEvent::Timer(TimerAction::Reset)),
            KeyCode::Char('[') => Command::Input(InputEvent::ChangeWeek(-1)),
            KeyCode::Char(']') => Command::Input(InputEvent::ChangeWeek(1)),
            KeyCode::Char('h') | KeyCode::Left => Command::Input(InputEvent::ChangeDay(-1)),
            KeyCode::Char('l') | KeyCode::Right => Command::Input(InputEvent::ChangeDay(1)),
            KeyCode::Char('1') => Command::Input(InputEvent::SelectTab(Tab::Workout)),
            KeyCode::Char('2') => Command::Input(InputEvent::SelectTab(Tab::Stats)),
            KeyCode::Char('j') | KeyCode::Down => Command::SelectNext,
            KeyCode::Char('k') | KeyCode::Up => Command::SelectPrev,
            KeyCode::Enter | KeyCode::Char('x') => {
                let view = self.state.view();
                let control: &SetControl = view.set_controls().get(self.selected).copied()?;
                Command::Input(InputEvent::SetToggle {
                    exercise_id: control.exercise_id.clone(),
                    set_number: control.set_number,
                })
            }
            _ => return None,
        };
        Some(command)
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Quit => self.should_quit = true,
            Command::SelectNext => {
                let count = self.state.view().set_controls().len();
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            Command::SelectPrev => self.selected = self.selected.saturating_sub(1),
            Command::Input(event) => {
                let day_change = matches!(event, InputEvent::ChangeDay(_));
                if self.state.handle(event) && day_change {
                    self.selected = 0;
                }
            }
        }
    }
}

/// Text lines for a day plus the line index of the selected set row
fn workout_lines(view: &WorkoutView, selected: usize) -> (Vec<Line<'static>>, Option<usize>) {
    let cards = match view {
        WorkoutView::RestDay => {
            return (vec![Line::from("🏖️ Rest day today!").centered()], None);
        }
        WorkoutView::Exercises(cards) => cards,
    };

    let mut lines = Vec::new();
    let mut selected_line = None;
    let mut row_index = 0;

    for card in cards {
        lines.push(card_title(card));

        if !card.params.is_empty() {
            let params: Vec<String> = card
                .params
                .iter()
                .map(|p| format!("{} {}", p.label, p.value))
                .collect();
            lines.push(Line::from(format!("   {}", params.join(" | "))).fg(Color::Gray));
        }

        for row in &card.sets {
            let mut text = format!("   [{}] {}  {}", row.check_icon(), row.number, row.reps);
            if let Some(weight) = &row.weight {
                text.push_str(&format!("  {}", weight));
            }
            if let Some(rest) = &row.rest {
                text.push_str(&format!("  ⏱️ {}", rest));
            }

            let mut style = if row.completed {
                Style::default().fg(Color::Green)
            } else {
                Style::default()
            };
            if row_index == selected {
                style = style.add_modifier(Modifier::REVERSED);
                selected_line = Some(lines.len());
            }
            lines.push(Line::styled(text, style));
            row_index += 1;
        }

        if let Some(notes) = &card.notes {
            lines.push(Line::from(format!("   📝 {}", notes)).fg(Color::DarkGray));
        }
        if let Some(progression) = &card.progression {
            let line = Line::from(format!("   ☑️ Progression {}", progression.label()));
            lines.push(line.fg(Color::Cyan));
        }
        lines.push(Line::from(""));
    }

    (lines, selected_line)
}

fn card_title(card: &ExerciseCard) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{} {}", card.icon, card.name),
        Style::default().bold(),
    )];
    if card.superset.is_superset() {
        spans.push(Span::styled(" [superset]", Style::default().fg(Color::Magenta)));
    }
    if let Some(category) = &card.category {
        spans.push(Span::raw(format!("  {}", category)));
    }
    if let Some(muscles) = &card.muscles {
        spans.push(Span::raw(format!("  🎯 {}", muscles)));
    }
    Line::from(spans)
}

fn render_banner(frame: &mut Frame, area: Rect, text: &str, phase: BannerPhase) {
    let style = match phase {
        BannerPhase::Fading(opacity) if opacity < 0.5 => Style::default().fg(Color::DarkGray),
        _ => Style::default().fg(Color::White).bg(Color::Red).bold(),
    };

    let width = (text.chars().count() as u16 + 8).min(area.width);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(3) / 2,
        width,
        height: 3.min(area.height),
    };

    frame.render_widget(Clear, popup);
    let banner = Paragraph::new(text.to_string())
        .centered()
        .style(style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(banner, popup);
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionStore;
    use crate::timer::testing::recording_engine;
    use crate::workout::Program;
    use tokio::sync::mpsc;

    fn create_app() -> (App, mpsc::UnboundedSender<TickId>) {
        let (engine, _schedule, _alerts) = recording_engine();
        let state = AppState::new(Program::demo(), engine);
        let db = Database::open(":memory:").unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(state, db, rx).unwrap(), tx)
    }

    #[test]
    fn test_enter_toggles_selected_set() {
        let (mut app, _tx) = create_app();
        app.apply(Command::SelectNext);
        let command = app.map_key(KeyCode::Enter).unwrap();
        app.apply(command);

        assert!(app.state.completion.is_completed("squat", 2));
        assert!(app.state.timer.is_running());
    }

    #[test]
    fn test_enter_on_rest_day_does_nothing() {
        let (mut app, _tx) = create_app();
        app.apply(Command::Input(InputEvent::ChangeDay(2)));
        assert!(app.map_key(KeyCode::Enter).is_none());
    }

    #[test]
    fn test_selection_stays_in_bounds() {
        let (mut app, _tx) = create_app();
        app.apply(Command::SelectPrev);
        assert_eq!(app.selected, 0);

        let count = app.state.view().set_controls().len();
        for _ in 0..count + 5 {
            app.apply(Command::SelectNext);
        }
        assert_eq!(app.selected, count - 1);

        app.apply(Command::Input(InputEvent::ChangeDay(1)));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_space_maps_to_timer_toggle() {
        let (app, _tx) = create_app();
        assert_eq!(
            app.map_key(KeyCode::Char(' ')),
            Some(Command::Input(InputEvent::Timer(TimerAction::Toggle)))
        );
        assert_eq!(app.map_key(KeyCode::Char('q')), Some(Command::Quit));
        assert_eq!(app.map_key(KeyCode::Char('z')), None);
    }

    #[test]
    fn test_finished_rest_is_logged() {
        let (mut app, tx) = create_app();
        app.state.handle(InputEvent::SetToggle {
            exercise_id: "calves".to_string(),
            set_number: 1,
        });
        // Recording engine hands out ids from 0; the rest countdown is the first stream
        for _ in 0..45 {
            tx.send(TickId(0)).unwrap();
        }
        app.drain_ticks();

        assert!(app.state.timer.is_finished());
        assert_eq!(app.rests.len(), 1);
        assert_eq!(app.rests[0].exercise_id.as_deref(), Some("calves"));
        assert_eq!(app.db.get_rests(10).unwrap().len(), 1);
    }

    #[test]
    fn test_resuming_finished_rest_logs_once() {
        let (mut app, tx) = create_app();
        app.state.handle(InputEvent::SetToggle {
            exercise_id: "calves".to_string(),
            set_number: 1,
        });
        for _ in 0..45 {
            tx.send(TickId(0)).unwrap();
        }
        app.drain_ticks();

        app.apply(Command::Input(InputEvent::Timer(TimerAction::Toggle)));
        for _ in 0..3 {
            tx.send(TickId(1)).unwrap();
        }
        app.drain_ticks();

        assert!(app.state.timer.is_running());
        assert_eq!(app.state.timer.elapsed(), 48);
        assert_eq!(app.rests.len(), 1);
        assert_eq!(app.db.get_rests(10).unwrap().len(), 1);
    }

    #[test]
    fn test_workout_lines_mark_selection() {
        let (app, _tx) = create_app();
        let view = app.state.view();
        let (lines, selected) = workout_lines(&view, 0);
        // Title and params precede the first set row
        assert_eq!(selected, Some(2));
        assert!(lines.len() > 2);

        let (lines, selected) = workout_lines(&WorkoutView::RestDay, 0);
        assert_eq!(lines.len(), 1);
        assert_eq!(selected, None);
    }
}
