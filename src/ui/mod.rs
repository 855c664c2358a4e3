//! Terminal pages. Each page runs its own draw/input loop and returns the
//! [`Action`] the caller should take next.

use crate::guard::Route;
use color_eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use std::{
    io::{stdout, Stdout},
    rc::Rc,
    time::{Duration, Instant},
};

mod admin;
mod chat;
mod dashboard;
mod diary;
pub mod input;
mod login;

use input::{Form, FormEvent, TextInput};

pub(crate) type Term = Terminal<CrosstermBackend<Stdout>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Navigate(Route),
    Logout,
    Quit,
}

pub struct UI {
    terminal: Term,
    cursor_visible: bool,
    last_cursor_update: Instant,
}

impl UI {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        Ok(UI {
            terminal,
            cursor_visible: true,
            last_cursor_update: Instant::now(),
        })
    }

    fn blink(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last_cursor_update) >= Duration::from_millis(500) {
            self.cursor_visible = !self.cursor_visible;
            self.last_cursor_update = now;
        }
        self.cursor_visible
    }

    /// Blocking notice, dismissed with any key.
    pub fn alert(&mut self, heading: &str, message: &str) -> Result<()> {
        self.terminal.draw(|f| draw_popup(f, heading, message, "Press any key"))?;
        read_key()?;
        Ok(())
    }

    pub fn confirm(&mut self, message: &str) -> Result<bool> {
        self.terminal
            .draw(|f| draw_popup(f, "Confirm", message, "y: Yes, n/Esc: No"))?;
        loop {
            match read_key()?.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => return Ok(true),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return Ok(false),
                _ => {}
            }
        }
    }

    pub fn show_busy(&mut self, heading: &str, message: &str) -> Result<()> {
        self.terminal.draw(|f| draw_popup(f, heading, message, ""))?;
        Ok(())
    }

    /// Edits `form` until it is submitted (`true`) or cancelled (`false`).
    pub fn edit_form(&mut self, heading: &str, form: &mut Form, status: Option<&str>) -> Result<bool> {
        loop {
            self.terminal.draw(|f| {
                let mut constraints = vec![Constraint::Length(3)];
                constraints.extend(form.fields.iter().map(|_| Constraint::Length(3)));
                constraints.push(Constraint::Length(2));
                constraints.push(Constraint::Min(0));
                constraints.push(Constraint::Length(3));
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints(constraints)
                    .split(f.area());

                f.render_widget(title(heading), chunks[0]);

                for (i, field) in form.fields.iter().enumerate() {
                    let style = if i == form.focus {
                        Style::default().fg(Color::Cyan)
                    } else {
                        Style::default()
                    };
                    let widget = Paragraph::new(form.shown_value(i)).block(
                        Block::default()
                            .borders(Borders::ALL)
                            .border_style(style)
                            .title(field.label),
                    );
                    f.render_widget(widget, chunks[i + 1]);
                }

                if let Some(status) = status {
                    let status = Paragraph::new(status.to_string())
                        .style(Style::default().fg(Color::Red))
                        .alignment(Alignment::Center);
                    f.render_widget(status, chunks[form.fields.len() + 1]);
                }

                let hint = if form.fields.iter().any(|field| field.masked) {
                    "Tab/Up/Down: Move, Enter: Next/Submit, F2: Show password, Esc: Cancel"
                } else {
                    "Tab/Up/Down: Move, Enter: Next/Submit, Esc: Cancel"
                };
                f.render_widget(instructions(hint), chunks[chunks.len() - 1]);
            })?;

            match form.handle_key(read_key()?) {
                FormEvent::Submit => return Ok(true),
                FormEvent::Cancel => return Ok(false),
                FormEvent::Continue => {}
            }
        }
    }

    /// Vertical menu; returns the chosen index or `None` on Esc.
    pub fn select(&mut self, heading: &str, subtitle: &str, items: &[&str]) -> Result<Option<usize>> {
        let mut selected_index = 0;

        loop {
            self.terminal.draw(|f| {
                let chunks = screen_chunks(f.area(), Constraint::Min(5));
                f.render_widget(title(heading), chunks[0]);

                let list_items: Vec<ListItem> = items
                    .iter()
                    .map(|item| ListItem::new(Line::from(Span::raw(item.to_string()))))
                    .collect();
                let list = List::new(list_items)
                    .block(Block::default().borders(Borders::ALL).title(subtitle.to_string()))
                    .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                    .highlight_symbol("> ");
                f.render_stateful_widget(
                    list,
                    chunks[1],
                    &mut ListState::default().with_selected(Some(selected_index)),
                );

                f.render_widget(
                    instructions("Up/Down: Navigate, Enter: Select, Esc: Back"),
                    chunks[2],
                );
            })?;

            match read_key()?.code {
                KeyCode::Up => selected_index = selected_index.saturating_sub(1),
                KeyCode::Down => {
                    if selected_index + 1 < items.len() {
                        selected_index += 1;
                    }
                }
                KeyCode::Enter if !items.is_empty() => return Ok(Some(selected_index)),
                KeyCode::Esc => return Ok(None),
                _ => {}
            }
        }
    }

    /// Multi-line editor with a blinking cursor. Ctrl+S keeps the text,
    /// Esc discards it.
    pub fn edit_text(&mut self, heading: &str, initial: &str) -> Result<Option<String>> {
        let mut text = TextInput::new(initial);

        loop {
            let visible = self.blink();
            self.terminal.draw(|f| {
                let chunks = screen_chunks(f.area(), Constraint::Min(10));
                f.render_widget(title(heading), chunks[0]);

                let content = Paragraph::new(text.with_cursor_marker(visible))
                    .wrap(Wrap { trim: false })
                    .block(Block::default().borders(Borders::ALL).title("Content"));
                f.render_widget(content, chunks[1]);

                f.render_widget(instructions("Ctrl+S: Save, Esc: Cancel"), chunks[2]);
            })?;

            if let Some(key) = poll_key(Duration::from_millis(50))? {
                match key.code {
                    KeyCode::Esc => return Ok(None),
                    KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(Some(text.into_content()));
                    }
                    _ => {
                        text.handle_key(key);
                    }
                }
            }
        }
    }
}

impl Drop for UI {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

/// Blocks until a key is pressed. Release and repeat events are skipped.
pub(crate) fn read_key() -> Result<KeyEvent> {
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(key);
            }
        }
    }
}

pub(crate) fn poll_key(timeout: Duration) -> Result<Option<KeyEvent>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                return Ok(Some(key));
            }
        }
    }
    Ok(None)
}

pub(crate) fn screen_chunks(area: Rect, body: Constraint) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(3), body, Constraint::Length(3)])
        .split(area)
}

pub(crate) fn title(text: &str) -> Paragraph<'static> {
    Paragraph::new(text.to_string())
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
}

pub(crate) fn instructions(text: &str) -> Paragraph<'static> {
    Paragraph::new(text.to_string())
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
}

fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_popup(f: &mut Frame, heading: &str, message: &str, hint: &str) {
    let area = centered(f.area(), 60, 9);
    f.render_widget(Clear, area);

    let mut lines = vec![Line::from(message.to_string()), Line::from("")];
    if !hint.is_empty() {
        lines.push(Line::from(Span::styled(
            hint.to_string(),
            Style::default().fg(Color::Yellow),
        )));
    }
    let popup = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(heading.to_string())
                .title_style(Style::default().add_modifier(Modifier::BOLD)),
        );
    f.render_widget(popup, area);
}
