use std::io::{self, Stdout};

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table};
use ratatui::{Frame, Terminal};

use crate::manager::SortMode;
use crate::process::ProcessSample;

const GREEN_THRESHOLD: f64 = 30.0;
const YELLOW_THRESHOLD: f64 = 70.0;

const STATS_HEIGHT: u16 = 4;
const HELP_TEXT: &str =
    "q:quit  p:PID  c:CPU  m:MEM  \u{2191}/\u{2193}:navigate  PgUp/PgDn:scroll  k:TERM  K:KILL  /:filter";

// status panel, table border and header, help line, filter line
const CHROME_HEIGHT: u16 = STATS_HEIGHT + 3 + 2;

/// Everything needed to paint one frame of the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardFrame<'a> {
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub rows: &'a [ProcessSample],
    pub offset: usize,
    pub selected: usize,
    pub page_size: usize,
    pub sort_mode: SortMode,
    pub filter_prompt: Option<&'a str>,
    pub spinner: char,
}

impl<'a> DashboardFrame<'a> {
    /// The rows that fall inside the viewport.
    pub fn window(&self) -> &'a [ProcessSample] {
        let start = self.offset.min(self.rows.len());
        let end = (start + self.page_size).min(self.rows.len());
        &self.rows[start..end]
    }
}

/// Drawing surface the dashboard paints on.
pub trait Renderer {
    /// How many table rows fit on screen right now.
    fn page_size(&self) -> usize;

    fn draw(&mut self, frame: &DashboardFrame<'_>) -> Result<()>;
}

/// Green up to 30%, yellow up to 70%, red above.
pub fn severity_color(percent: f64) -> Color {
    if percent <= GREEN_THRESHOLD {
        Color::Green
    } else if percent <= YELLOW_THRESHOLD {
        Color::Yellow
    } else {
        Color::Red
    }
}

pub fn truncate_name(name: &str, width: usize) -> String {
    name.chars().take(width).collect()
}

/// Renders the dashboard with ratatui.
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
    name_width: usize,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn with_backend(backend: B, name_width: usize) -> Result<Self> {
        let terminal = Terminal::new(backend).context("Failed to create terminal")?;
        Ok(TerminalRenderer {
            terminal,
            name_width: name_width.max(1),
        })
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }
}

impl TerminalRenderer<CrosstermBackend<Stdout>> {
    /// Take over stdout: raw mode, alternate screen, hidden cursor.
    /// `restore_terminal` undoes this.
    pub fn stdout(name_width: usize) -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide).context("Failed to enter alternate screen")?;
        Self::with_backend(CrosstermBackend::new(stdout), name_width)
    }
}

pub fn restore_terminal() {
    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, Show, LeaveAlternateScreen).ok();
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn page_size(&self) -> usize {
        match self.terminal.size() {
            Ok(size) => size.height.saturating_sub(CHROME_HEIGHT).max(1) as usize,
            Err(_) => 1,
        }
    }

    fn draw(&mut self, frame: &DashboardFrame<'_>) -> Result<()> {
        let name_width = self.name_width;
        self.terminal
            .draw(|f| draw_dashboard(f, frame, name_width))
            .context("Failed to draw dashboard")?;
        Ok(())
    }
}

fn draw_dashboard(f: &mut Frame<'_>, frame: &DashboardFrame<'_>, name_width: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(STATS_HEIGHT),
            Constraint::Min(3),
            Constraint::Length(1), // help
            Constraint::Length(1), // filter prompt
        ])
        .split(f.area());

    draw_stats(f, chunks[0], frame);
    draw_process_table(f, chunks[1], frame, name_width);
    f.render_widget(Paragraph::new(HELP_TEXT), chunks[2]);

    if let Some(prompt) = frame.filter_prompt {
        f.render_widget(Paragraph::new(format!("/{}", prompt)), chunks[3]);
    }
}

fn draw_stats(f: &mut Frame<'_>, area: Rect, frame: &DashboardFrame<'_>) {
    let block = Block::default().borders(Borders::ALL).title(" SYSTEM USAGE ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    draw_gauge(f, lines[0], "CPU Total:", frame.cpu_percent);
    draw_gauge(f, lines[1], "Mem Total:", frame.mem_percent);
}

fn draw_gauge(f: &mut Frame<'_>, area: Rect, label: &str, percent: f64) {
    let text = format!("{}{:6.2}% ", label, percent);
    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(text.len() as u16), Constraint::Min(5)])
        .split(area);

    f.render_widget(Paragraph::new(text), parts[0]);
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(severity_color(percent)))
        .ratio((percent / 100.0).clamp(0.0, 1.0))
        .label("");
    f.render_widget(gauge, parts[1]);
}

fn draw_process_table(f: &mut Frame<'_>, area: Rect, frame: &DashboardFrame<'_>, name_width: usize) {
    let header = Row::new(["PID", "NAME", "CPU%", "MEM%", "TIME"])
        .style(Style::default().fg(Color::White).bg(Color::Blue));

    let rows = frame.window().iter().enumerate().map(|(i, p)| {
        let index = frame.offset + i;
        let style = if index == frame.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            let mut style = Style::default();
            if index % 2 == 1 {
                style = style.bg(Color::DarkGray);
            }
            if p.cpu_percent > YELLOW_THRESHOLD {
                style = style.fg(Color::Red);
            } else if p.cpu_percent > GREEN_THRESHOLD {
                style = style.fg(Color::Yellow);
            }
            style
        };

        Row::new([
            Cell::from(p.pid.to_string()),
            Cell::from(truncate_name(&p.name, name_width)),
            Cell::from(format!("{:6.2}", p.cpu_percent.max(0.0))),
            Cell::from(format!("{:6.2}", p.mem_percent.max(0.0))),
            Cell::from(p.elapsed_secs.to_string()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(6),
        Constraint::Length(u16::try_from(name_width).unwrap_or(u16::MAX)),
        Constraint::Length(6),
        Constraint::Length(6),
        Constraint::Length(8),
    ];
    let title = format!(" PROCESS LIST {} [sort: {}] ", frame.spinner, frame.sort_mode.label());
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}
