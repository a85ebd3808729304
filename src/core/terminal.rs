//! Concrete renderers: full-screen TUI, plain text frames and JSON lines.

use std::io::Write;

use crossterm::{cursor, terminal, QueueableCommand};
use ratatui::backend::Backend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::{Frame, Terminal};

use serde::Serialize;

use crate::core::registry::Entity;
use crate::core::renderer::{self, GameRenderer, Panels, Snapshot};

/// Full-screen layout drawn through ratatui: header, game panel with a
/// stats sidebar, footer.
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn into_inner(self) -> Terminal<B> {
        self.terminal
    }

    fn draw_panels(frame: &mut Frame, panels: &Panels) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(3, 4), Constraint::Ratio(1, 4)])
            .split(rows[1]);

        frame.render_widget(
            Paragraph::new(panels.header.as_str())
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            rows[0],
        );
        frame.render_widget(
            Paragraph::new(panels.main.join("\n"))
                .block(Block::default().title(" WORLD ").borders(Borders::ALL)),
            columns[0],
        );
        frame.render_widget(
            Paragraph::new(panels.sidebar.join("\n"))
                .block(Block::default().title(" STATS ").borders(Borders::ALL)),
            columns[1],
        );
        frame.render_widget(
            Paragraph::new(panels.footer.as_str())
                .style(Style::default().fg(Color::Gray))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL)),
            rows[2],
        );
    }

    fn draw_title(frame: &mut Frame, title: &str) {
        let area = frame.area();
        let middle = area.height / 2;
        let line = |y: u16| Rect::new(area.x, area.y + y.min(area.height.saturating_sub(1)), area.width, 1);

        frame.render_widget(
            Paragraph::new(title)
                .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
                .alignment(Alignment::Center),
            line(middle.saturating_sub(1)),
        );
        frame.render_widget(
            Paragraph::new("Press any key to start")
                .style(Style::default().fg(Color::Cyan))
                .alignment(Alignment::Center),
            line(middle + 1),
        );
    }
}

impl<B: Backend> GameRenderer for TerminalRenderer<B> {
    fn render(&mut self, snapshot: &Snapshot<'_>) -> anyhow::Result<()> {
        let panels = Panels::from_snapshot(snapshot);
        self.terminal
            .draw(|f| Self::draw_panels(f, &panels))
            .map_err(|err| anyhow::anyhow!("failed to draw frame: {err}"))?;
        Ok(())
    }

    fn show_title(&mut self, title: &str) -> anyhow::Result<()> {
        self.terminal
            .draw(|f| Self::draw_title(f, title))
            .map_err(|err| anyhow::anyhow!("failed to draw title screen: {err}"))?;
        Ok(())
    }
}

/// Line-oriented frames for plain terminals and pipes.
pub struct PlainRenderer<W: Write> {
    out: W,
    clear_screen: bool,
    line_end: &'static str,
}

impl<W: Write> PlainRenderer<W> {
    /// Append frames one after another.
    pub fn new(out: W) -> Self {
        Self {
            out,
            clear_screen: false,
            line_end: "\n",
        }
    }

    /// Redraw in place on a raw-mode terminal.
    pub fn interactive(out: W) -> Self {
        Self {
            out,
            clear_screen: true,
            line_end: "\r\n",
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn clear(&mut self) -> anyhow::Result<()> {
        if self.clear_screen {
            self.out.queue(cursor::MoveTo(0, 0))?;
            self.out.queue(terminal::Clear(terminal::ClearType::All))?;
        }
        Ok(())
    }

    fn line(&mut self, text: &str) -> anyhow::Result<()> {
        write!(self.out, "{}{}", text, self.line_end)?;
        Ok(())
    }
}

impl<W: Write> GameRenderer for PlainRenderer<W> {
    fn render(&mut self, snapshot: &Snapshot<'_>) -> anyhow::Result<()> {
        let panels = Panels::from_snapshot(snapshot);

        self.clear()?;
        self.line(&format!("== {} ==", panels.header))?;
        for line in &panels.main {
            self.line(line)?;
        }
        self.line("-- stats --")?;
        for line in &panels.sidebar {
            self.line(line)?;
        }
        if !panels.footer.is_empty() {
            self.line(&panels.footer)?;
        }
        self.line("")?;

        self.out.flush()?;
        Ok(())
    }

    fn show_title(&mut self, title: &str) -> anyhow::Result<()> {
        self.clear()?;
        self.line(&format!("== {title} =="))?;
        if self.clear_screen {
            self.line("Press any key to start")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Panel text plus the entities it was drawn from.
#[derive(Serialize)]
struct JsonFrame<'a> {
    #[serde(flatten)]
    panels: Panels,
    entities: Vec<&'a Entity>,
}

/// One JSON document per frame, for machine consumers.
pub struct JsonRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> GameRenderer for JsonRenderer<W> {
    fn render(&mut self, snapshot: &Snapshot<'_>) -> anyhow::Result<()> {
        let frame = JsonFrame {
            panels: Panels::from_snapshot(snapshot),
            entities: renderer::drawable(snapshot).into_iter().map(|(entity, _)| entity).collect(),
        };
        serde_json::to_writer(&mut self.out, &frame)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
