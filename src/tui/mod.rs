//! TUI module - Terminal dashboard with ratatui
//!
//! Read-only over the workout data: navigation, the template echo and the
//! AI review live here; edits go through the CLI. The review call runs on
//! the tokio runtime and reports back over a channel polled by the event
//! loop, so the dashboard stays interactive while it is in flight.

use std::io::{Stdout, stdout};
use std::sync::mpsc::{Receiver, channel};
use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
};

use crate::ai::{GeminiClient, RequestState};
use crate::model::{AppState, Exercise};
use crate::store::Store;
use crate::sync::SyncTimer;
use crate::workout::{navigate, resolve};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// App state for the dashboard.
pub struct App {
    store: Store,
    state: AppState,
    week: u32,
    day: u32,
    review: RequestState<String>,
    review_rx: Option<Receiver<String>>,
    sync: SyncTimer,
    /// Nudge until the user signs in or explicitly skips login once.
    show_login_hint: bool,
    should_quit: bool,
}

impl App {
    pub fn new(store: Store) -> Result<Self> {
        let state = store.load_state()?;
        let show_login_hint = state.user.is_none() && !store.skip_login()?;
        let mut sync = SyncTimer::new();
        // The initial load counts as a state change for the indicator.
        sync.touch(state.user.is_some(), Instant::now());
        Ok(Self {
            store,
            state,
            week: 1,
            day: 1,
            review: RequestState::Idle,
            review_rx: None,
            sync,
            show_login_hint,
            should_quit: false,
        })
    }

    /// Run the dashboard loop.
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            self.poll_review();
            if self.sync.tick(Instant::now()) {
                // Stamping last_sync does not re-arm the timer.
                self.state.last_sync = Some(Utc::now());
                self.store.save_state(&self.state)?;
            }
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    fn poll_review(&mut self) {
        if let Some(rx) = &self.review_rx
            && let Ok(text) = rx.try_recv()
        {
            self.review = RequestState::Succeeded(text);
            self.review_rx = None;
        }
    }

    /// Kick off a review for the viewed day unless one is already pending.
    fn trigger_review(&mut self) {
        if self.review.is_in_flight() {
            return;
        }
        let Some(program) = self.state.active_program() else {
            return;
        };
        let workout = resolve(program, self.week, self.day);
        if workout.exercises.is_empty() {
            return;
        }

        match GeminiClient::from_env() {
            Ok(client) => {
                let program = program.clone();
                let (tx, rx) = channel();
                self.review_rx = Some(rx);
                self.review = RequestState::InFlight;
                tokio::spawn(async move {
                    let text = client.analyze_progress(&program, &workout).await;
                    let _ = tx.send(text);
                });
            }
            Err(e) => self.review = RequestState::Failed(e.to_string()),
        }
    }

    fn navigate_view(&mut self, delta_day: i32, delta_week: i32) {
        let Some(program) = self.state.active_program() else {
            return;
        };
        let (week, day) = navigate(&program.plan, self.week, self.day, delta_day, delta_week);
        self.week = week;
        self.day = day;
        self.review = RequestState::Idle;
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(7),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let title = match self.state.active_program() {
            Some(program) => format!(
                "{} | WK {} DAY {} | target {}",
                program.name,
                self.week,
                self.day,
                program.plan.rep_range_for_week(self.week)
            ),
            None => "no active program - create one with `cyclelift create`".to_string(),
        };
        let header = Paragraph::new(title)
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL).title("CycleLift"));
        frame.render_widget(header, chunks[0]);

        // Workout table
        let (rows, unit) = match self.state.active_program() {
            Some(program) => {
                let workout = resolve(program, self.week, self.day);
                let rows: Vec<Row> = workout
                    .exercises
                    .iter()
                    .map(|ex| {
                        let name = if ex.target.is_custom() {
                            format!("{} *", ex.name)
                        } else {
                            ex.name.clone()
                        };
                        Row::new(vec![
                            Cell::from(name),
                            Cell::from(ex.target.range().to_string()),
                            Cell::from(format_sets(ex)),
                        ])
                    })
                    .collect();
                (rows, program.plan.weight_unit.to_string())
            }
            None => (Vec::new(), "lb".to_string()),
        };

        let table = Table::new(
            rows,
            [
                Constraint::Length(24),
                Constraint::Length(10),
                Constraint::Min(20),
            ],
        )
        .header(
            Row::new(vec![
                "Exercise".to_string(),
                "Target".to_string(),
                format!("Sets ({unit})"),
            ])
            .style(Style::default().bold()),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Workout (* = custom reps)"),
        );
        frame.render_widget(table, chunks[1]);

        // Review panel
        let review_text = match &self.review {
            RequestState::Idle => "press a for a performance review".to_string(),
            RequestState::InFlight => "consulting the coach...".to_string(),
            RequestState::Succeeded(text) => text.clone(),
            RequestState::Failed(e) => e.clone(),
        };
        let review = Paragraph::new(review_text)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Performance Review"),
            );
        frame.render_widget(review, chunks[2]);

        // Footer
        let mut footer_text = format!(
            "q: quit | h/l: day | k/j: week | t: today | a: review | r: reload   [{}]",
            self.sync.status().label()
        );
        if self.show_login_hint {
            footer_text.push_str("   `cyclelift login` to sync");
        }
        let footer = Paragraph::new(footer_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('r') => {
                    self.state = self.store.load_state()?;
                    self.review = RequestState::Idle;
                    self.show_login_hint =
                        self.state.user.is_none() && !self.store.skip_login()?;
                    self.sync.touch(self.state.user.is_some(), Instant::now());
                }
                KeyCode::Left | KeyCode::Char('h') => self.navigate_view(-1, 0),
                KeyCode::Right | KeyCode::Char('l') => self.navigate_view(1, 0),
                KeyCode::Up | KeyCode::Char('k') => self.navigate_view(0, -1),
                KeyCode::Down | KeyCode::Char('j') => self.navigate_view(0, 1),
                KeyCode::Char('t') => {
                    self.week = 1;
                    self.day = 1;
                    self.review = RequestState::Idle;
                }
                KeyCode::Char('a') => self.trigger_review(),
                _ => {}
            }
        }
        Ok(())
    }
}

fn format_sets(exercise: &Exercise) -> String {
    if exercise.sets.is_empty() {
        return "-".to_string();
    }
    exercise
        .sets
        .iter()
        .map(|s| format!("{}x{}", s.weight, s.reps))
        .collect::<Vec<_>>()
        .join(" ")
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
