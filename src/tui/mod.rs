//! TUI module - Terminal dashboard with ratatui

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::io::{Stdout, stdout};

use crate::activity::{
    ActivityKind, ActivityLogEntry, DayMark, DayPlan, DaySnapshot, DayStatus, LogRequest, PlanSource, Streak,
    compute_streak, log_activity, week_strip,
};
use crate::config::Config;
use crate::db::Database;

type Tui = Terminal<CrosstermBackend<Stdout>>;

const RECENT_LIMIT: usize = 20;

/// App state for TUI
pub struct App {
    db: Database,
    config: Config,
    today: DaySnapshot,
    entries: Vec<ActivityLogEntry>,
    streak: Streak,
    strip: [DayMark; 7],
    status: Option<String>,
    should_quit: bool,
}

impl App {
    pub fn new(db: Database, config: Config) -> Result<Self> {
        let date = config.calendar.today();
        let today = db.day_snapshot(date, config.count_policy)?;
        let entries = db.get_activities()?;
        let streak = compute_streak(&entries, date);
        let strip = week_strip(&entries, date);
        Ok(Self {
            db,
            config,
            today,
            entries,
            streak,
            strip,
            status: None,
            should_quit: false,
        })
    }

    fn refresh(&mut self) -> Result<()> {
        let date = self.config.calendar.today();
        self.today = self.db.day_snapshot(date, self.config.count_policy)?;
        self.entries = self.db.get_activities()?;
        self.streak = compute_streak(&self.entries, date);
        self.strip = week_strip(&self.entries, date);
        Ok(())
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        let result = (|| -> Result<()> {
            while !self.should_quit {
                terminal.draw(|frame| self.render(frame))?;
                self.handle_events()?;
            }
            Ok(())
        })();

        restore_terminal()?;
        result
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(9),
                Constraint::Min(8),
                Constraint::Length(3),
            ])
            .split(area);

        let header = Paragraph::new(format!("liftlog - {}", self.today.date.format("%A, %d %B %Y")))
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        frame.render_widget(self.today_panel(), middle[0]);
        frame.render_widget(self.streak_panel(), middle[1]);

        frame.render_widget(self.history_table(), chunks[2]);

        let footer_text = match &self.status {
            Some(status) => format!("{} | q: quit | r: refresh | l: log workout | s: rest day", status),
            None => "q: quit | r: refresh | l: log workout | s: rest day".to_string(),
        };
        let footer = Paragraph::new(footer_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }

    fn today_panel(&self) -> Paragraph<'_> {
        let mut lines: Vec<Line> = Vec::new();
        match self.today.resolve() {
            DayPlan::Workout { plan, source } => {
                let tag = match source {
                    PlanSource::Logged => "done",
                    PlanSource::Override => "picked",
                    PlanSource::Rotation => "up next",
                };
                lines.push(Line::from(vec![
                    Span::styled(plan.name.clone(), Style::default().bold()),
                    Span::styled(format!("  ({})", tag), Style::default().fg(Color::DarkGray)),
                ]));
                for slot in &plan.exercises {
                    lines.push(Line::from(format!(
                        "{}. {}  {}x{}",
                        slot.position, slot.exercise_name, slot.sets, slot.reps
                    )));
                }
            }
            DayPlan::Rest => lines.push(Line::from("Rest day logged").style(Style::default().fg(Color::Blue))),
            DayPlan::NoPlans => lines.push(Line::from("No plans yet: `liftlog plan create <name>`")),
        }
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Today"))
    }

    fn streak_panel(&self) -> Paragraph<'_> {
        let strip: Vec<Span> = self
            .strip
            .iter()
            .map(|mark| {
                let (symbol, color) = match mark.status {
                    DayStatus::Workout => ("W", Color::Green),
                    DayStatus::Rest => ("R", Color::Blue),
                    DayStatus::Empty => ("-", Color::DarkGray),
                };
                Span::styled(format!("{} ", symbol), Style::default().fg(color).bold())
            })
            .collect();
        let days: String = self
            .strip
            .iter()
            .map(|mark| format!("{} ", &mark.date.format("%a").to_string()[..1]))
            .collect();

        let lines = vec![
            Line::from(Span::styled(
                format!("{} day streak", self.streak.current),
                Style::default().fg(Color::Yellow).bold(),
            )),
            Line::from(self.streak.message()),
            Line::from(format!("Longest: {} days", self.streak.longest)),
            Line::from(""),
            Line::from(days).style(Style::default().fg(Color::DarkGray)),
            Line::from(strip),
        ];
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Streak"))
    }

    fn plan_name(&self, plan_id: i64) -> String {
        self.today
            .plans
            .iter()
            .find(|p| p.id == plan_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| format!("plan #{}", plan_id))
    }

    fn history_table(&self) -> Table<'_> {
        let rows: Vec<Row> = self
            .entries
            .iter()
            .take(RECENT_LIMIT)
            .map(|e| {
                let (what, volume) = match e.kind {
                    ActivityKind::Rest => ("Rest day".to_string(), String::from("-")),
                    ActivityKind::Workout { plan_id } => {
                        let volume: f64 = e.exercises.iter().map(|r| r.volume()).sum();
                        (self.plan_name(plan_id), format!("{:.0} kg", volume))
                    }
                };
                Row::new(vec![
                    Cell::from(e.date.format("%Y-%m-%d").to_string()),
                    Cell::from(what),
                    Cell::from(e.exercises.len().to_string()),
                    Cell::from(volume),
                    Cell::from(e.notes.lines().next().unwrap_or_default().to_string()),
                ])
            })
            .collect();

        Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(20),
                Constraint::Length(10),
                Constraint::Length(12),
                Constraint::Min(20),
            ],
        )
        .header(Row::new(vec!["Date", "Activity", "Exercises", "Volume", "Notes"]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Recent activity"))
    }

    fn log_today(&mut self, rest: bool) -> Result<()> {
        let date = self.today.date;
        let request = if rest {
            LogRequest::rest(date)
        } else {
            match self.today.resolve().plan() {
                Some(plan) => LogRequest::workout(date, plan),
                None => {
                    self.status = Some("Nothing to log: create a plan first".to_string());
                    return Ok(());
                }
            }
        };
        let status = match log_activity(&self.db, request) {
            Ok(entry) if entry.kind.is_rest() => "Rest day logged".to_string(),
            Ok(entry) => format!("Workout logged ({} exercises)", entry.exercises.len()),
            Err(e) => format!("Error: {}", e),
        };
        self.status = Some(status);
        self.refresh()
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('r') => {
                    self.status = None;
                    self.refresh()?;
                }
                KeyCode::Char('l') => self.log_today(false)?,
                KeyCode::Char('s') => self.log_today(true)?,
                _ => {}
            }
        }
        Ok(())
    }
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
