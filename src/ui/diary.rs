use super::input::{Field, Form};
use super::{instructions, read_key, screen_chunks, title, Action, UI};
use crate::api::ApiClient;
use crate::guard::Route;
use crate::models::DiaryEntry;
use crate::session::Session;
use chrono::{Local, NaiveDate};
use color_eyre::Result;
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

/// Dates list plus the entry currently opened.
#[derive(Debug, Default)]
struct DiaryView {
    dates: Vec<NaiveDate>,
    selected: usize,
    open: Option<DiaryEntry>,
    status: Option<String>,
}

impl DiaryView {
    /// Newest first.
    fn set_dates(&mut self, mut dates: Vec<NaiveDate>) {
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        self.dates = dates;
        self.selected = self.selected.min(self.dates.len().saturating_sub(1));
    }

    fn selected_date(&self) -> Option<NaiveDate> {
        self.dates.get(self.selected).copied()
    }

    fn select_date(&mut self, date: NaiveDate) {
        if let Some(index) = self.dates.iter().position(|d| *d == date) {
            self.selected = index;
        }
    }

    fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn down(&mut self) {
        if self.selected + 1 < self.dates.len() {
            self.selected += 1;
        }
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

impl UI {
    pub async fn diary(&mut self, client: &ApiClient, session: &Session) -> Result<Action> {
        let Some(user_id) = session.user_id else {
            self.alert("Diary", "User not found")?;
            return Ok(Action::Navigate(Route::UserDashboard));
        };

        let mut view = DiaryView::default();
        load_dates(client, user_id, &mut view).await;

        loop {
            self.draw_diary(&view)?;

            match read_key()?.code {
                KeyCode::Esc => return Ok(Action::Navigate(Route::UserDashboard)),
                KeyCode::Up => view.up(),
                KeyCode::Down => view.down(),
                KeyCode::Enter => {
                    if let Some(date) = view.selected_date() {
                        open_entry(client, user_id, date, &mut view).await;
                    }
                }
                KeyCode::Char('t') => {
                    let today = Local::now().date_naive();
                    view.select_date(today);
                    open_entry(client, user_id, today, &mut view).await;
                }
                KeyCode::Char('g') => {
                    let mut form = Form::new(vec![Field::new("Date (YYYY-MM-DD)", "")]);
                    let mut error = None;
                    while self.edit_form("Go to date", &mut form, error)? {
                        if let Some(date) = parse_date(form.value(0)) {
                            view.select_date(date);
                            open_entry(client, user_id, date, &mut view).await;
                            break;
                        }
                        error = Some("Use the format YYYY-MM-DD");
                    }
                }
                KeyCode::Char('e') => {
                    let Some(entry) = view.open.clone() else {
                        view.status = Some("Open a date first (Enter, t or g)".to_string());
                        continue;
                    };
                    let heading = format!("Diary - {}", entry.date.format("%A, %B %-d, %Y"));
                    if let Some(content) = self.edit_text(&heading, &entry.content)? {
                        let draft = DiaryEntry { content, ..entry };
                        match client.save_entry(&draft).await {
                            Ok(saved) => {
                                tracing::info!(date = %saved.date, "diary entry saved");
                                view.open = Some(saved);
                                load_dates(client, user_id, &mut view).await;
                                view.status = Some("Saved".to_string());
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "saving diary entry failed");
                                view.open = Some(draft);
                                view.status = Some("Failed to save entry".to_string());
                            }
                        }
                    }
                }
                KeyCode::Char('r') => load_dates(client, user_id, &mut view).await,
                _ => {}
            }
        }
    }

    fn draw_diary(&mut self, view: &DiaryView) -> Result<()> {
        self.terminal.draw(|f| {
            let chunks = screen_chunks(f.area(), Constraint::Min(10));
            f.render_widget(title("My Diary"), chunks[0]);

            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
                .split(chunks[1]);

            let items: Vec<ListItem> = view
                .dates
                .iter()
                .map(|date| ListItem::new(Line::from(Span::raw(date.format("%Y-%m-%d").to_string()))))
                .collect();
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("Entries"))
                .highlight_style(Style::default().add_modifier(Modifier::BOLD))
                .highlight_symbol("> ");
            let mut state = ListState::default()
                .with_selected((!view.dates.is_empty()).then_some(view.selected));
            f.render_stateful_widget(list, body[0], &mut state);

            let (heading, text) = match &view.open {
                Some(entry) if entry.content.is_empty() => (
                    entry.date.format("%A, %B %-d, %Y").to_string(),
                    "Nothing written yet. Press e to write.".to_string(),
                ),
                Some(entry) => (
                    entry.date.format("%A, %B %-d, %Y").to_string(),
                    entry.content.clone(),
                ),
                None => ("Entry".to_string(), String::new()),
            };
            let content = Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(heading));
            f.render_widget(content, body[1]);

            let footer = match &view.status {
                Some(status) => instructions(status).style(Style::default().fg(Color::Green)),
                None => instructions(
                    "Up/Down: Navigate, Enter: Open, t: Today, g: Go to date, e: Edit, r: Refresh, Esc: Back",
                ),
            };
            f.render_widget(footer, chunks[2]);
        })?;
        Ok(())
    }
}

async fn load_dates(client: &ApiClient, user_id: i64, view: &mut DiaryView) {
    match client.diary_dates(user_id).await {
        Ok(dates) => {
            view.set_dates(dates);
            view.status = None;
        }
        Err(e) => {
            tracing::error!(error = %e, "loading diary dates failed");
            view.status = Some(e.user_message());
        }
    }
}

/// Opens `date`; a day without an entry opens an unsaved blank one.
async fn open_entry(client: &ApiClient, user_id: i64, date: NaiveDate, view: &mut DiaryView) {
    match client.diary_entry(user_id, date).await {
        Ok(entry) => {
            view.open = Some(entry.unwrap_or_else(|| DiaryEntry::new(user_id, date, String::new())));
            view.status = None;
        }
        Err(e) => {
            tracing::error!(error = %e, %date, "loading diary entry failed");
            view.status = Some(e.user_message());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn dates_are_newest_first_and_selection_is_clamped() {
        let mut view = DiaryView::default();
        view.set_dates(vec![day(1), day(3), day(2), day(3)]);
        assert_eq!(view.dates, vec![day(3), day(2), day(1)]);

        view.down();
        view.down();
        view.down();
        assert_eq!(view.selected_date(), Some(day(1)));

        view.set_dates(vec![day(9)]);
        assert_eq!(view.selected_date(), Some(day(9)));

        view.set_dates(Vec::new());
        assert_eq!(view.selected_date(), None);
    }

    #[test]
    fn select_date_ignores_unknown_dates() {
        let mut view = DiaryView::default();
        view.set_dates(vec![day(1), day(2)]);
        view.select_date(day(1));
        assert_eq!(view.selected, 1);
        view.select_date(day(20));
        assert_eq!(view.selected, 1);
    }

    #[test]
    fn date_input_is_iso() {
        assert_eq!(parse_date(" 2024-05-03 "), Some(day(3)));
        assert_eq!(parse_date("03/05/2024"), None);
    }
}
