use super::input::TextInput;
use super::{instructions, poll_key, screen_chunks, title, Action, Term, UI};
use crate::api::ApiClient;
use crate::chat::{ChatEvent, Conversation, DIARY_GREETING};
use crate::guard::Route;
use crate::models::{ChatMessage, ChatRole};
use crate::session::Session;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Companion,
    Diary,
}

impl Mode {
    fn heading(self) -> &'static str {
        match self {
            Mode::Companion => "Chat with HeyBuddy",
            Mode::Diary => "Ask my diary",
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Mode::Companion => "Enter: Send, Ctrl+J: Joke, Esc: Back",
            Mode::Diary => "Enter: Ask, Esc: Back",
        }
    }
}

fn speaker(role: ChatRole) -> (&'static str, Color) {
    match role {
        ChatRole::User => ("You", Color::Green),
        ChatRole::Assistant => ("HeyBuddy", Color::Cyan),
        ChatRole::System => ("System", Color::DarkGray),
    }
}

fn transcript(messages: &[ChatMessage], loading: bool) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in messages {
        let (name, color) = speaker(message.role);
        let content = if message.content.is_empty() && loading {
            "..."
        } else {
            message.content.as_str()
        };
        let mut rows = content.split('\n');
        let first = rows.next().unwrap_or_default();
        lines.push(Line::from(vec![
            Span::styled(
                format!("{name}: "),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::raw(first.to_string()),
        ]));
        lines.extend(rows.map(|row| Line::from(row.to_string())));
        lines.push(Line::from(""));
    }
    lines
}

/// Rows `lines` occupy once wrapped at `width` columns.
fn wrapped_rows(lines: &[Line], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines
        .iter()
        .map(|line| {
            let columns: usize = line.spans.iter().map(|s| s.content.width()).sum();
            columns.div_ceil(width).max(1)
        })
        .sum()
}

fn draw_chat(
    terminal: &mut Term,
    mode: Mode,
    messages: &[ChatMessage],
    input: &TextInput,
    loading: bool,
    status: Option<&str>,
) -> std::io::Result<()> {
    terminal.draw(|f| {
        let chunks = screen_chunks(f.area(), Constraint::Min(6));
        f.render_widget(title(mode.heading()), chunks[0]);

        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(3)])
            .split(chunks[1]);

        let lines = transcript(messages, loading);
        let inner = body[0].inner(ratatui::layout::Margin::new(1, 1));
        let overflow = wrapped_rows(&lines, inner.width).saturating_sub(usize::from(inner.height));
        let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
        let conversation = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0))
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(conversation, body[0]);

        let (label, style) = if loading {
            ("Waiting for reply...", Style::default().fg(Color::DarkGray))
        } else {
            ("Message", Style::default())
        };
        let prompt = Paragraph::new(input.with_cursor_marker(!loading))
            .style(style)
            .block(Block::default().borders(Borders::ALL).title(label));
        f.render_widget(prompt, body[1]);

        let footer = match status {
            Some(status) => instructions(status).style(Style::default().fg(Color::Red)),
            None => instructions(mode.hint()),
        };
        f.render_widget(footer, chunks[2]);
    })?;
    Ok(())
}

impl UI {
    pub async fn chat(&mut self, client: &ApiClient) -> Result<Action> {
        self.chat_loop(client, Mode::Companion, Conversation::new(), None).await
    }

    pub async fn diary_chat(&mut self, client: &ApiClient, session: &Session) -> Result<Action> {
        let Some(user_id) = session.user_id else {
            self.alert("Diary chat", "User not found")?;
            return Ok(Action::Navigate(Route::UserDashboard));
        };
        self.chat_loop(
            client,
            Mode::Diary,
            Conversation::with_greeting(DIARY_GREETING),
            Some(user_id),
        )
        .await
    }

    async fn chat_loop(
        &mut self,
        client: &ApiClient,
        mode: Mode,
        mut conversation: Conversation,
        user_id: Option<i64>,
    ) -> Result<Action> {
        let mut input = TextInput::default();
        let mut status: Option<String> = None;

        loop {
            draw_chat(
                &mut self.terminal,
                mode,
                conversation.messages(),
                &input,
                conversation.is_loading(),
                status.as_deref(),
            )?;

            let Some(key) = poll_key(Duration::from_millis(100))? else {
                continue;
            };
            match key.code {
                KeyCode::Esc => return Ok(Action::Navigate(Route::UserDashboard)),
                KeyCode::Char('j')
                    if mode == Mode::Companion && key.modifiers.contains(KeyModifiers::CONTROL) =>
                {
                    match client.random_joke().await {
                        Ok(joke) => {
                            status = None;
                            conversation
                                .push_assistant(format!("Here's a joke: {}", joke.display_text()));
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "joke request failed");
                            status = Some("Failed to fetch joke.".to_string());
                        }
                    }
                }
                KeyCode::Enter => {
                    let text = std::mem::take(&mut input).into_content();
                    status = None;
                    match (mode, user_id) {
                        (Mode::Diary, Some(user_id)) => {
                            draw_chat(
                                &mut self.terminal,
                                mode,
                                conversation.messages(),
                                &input,
                                true,
                                None,
                            )?;
                            conversation.ask_diary(client, user_id, &text).await;
                        }
                        _ => self.stream_reply(client, &mut conversation, &text).await?,
                    }
                }
                _ => {
                    input.handle_key(key);
                }
            }
        }
    }

    /// Redraws after every fragment; shows the crisis alert once the reply
    /// has finished.
    async fn stream_reply(
        &mut self,
        client: &ApiClient,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<()> {
        let empty = TextInput::default();
        let terminal = &mut self.terminal;
        let mut draw_error = None;
        let mut alert = None;

        conversation
            .send(client, text, |event| match event {
                ChatEvent::Updated(messages) => {
                    if draw_error.is_none() {
                        draw_error =
                            draw_chat(terminal, Mode::Companion, messages, &empty, true, None).err();
                    }
                }
                ChatEvent::Alert(message) => alert = Some(message),
            })
            .await;

        if let Some(e) = draw_error {
            return Err(e.into());
        }
        if let Some(message) = alert {
            self.alert("Please reach out", message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_rows_counts_display_width() {
        let lines = vec![
            Line::from("abcdef"),
            Line::from(""),
            Line::from("日本語"),
            Line::from(vec![Span::raw("You: "), Span::raw("hello")]),
        ];
        // 6/4 -> 2, empty -> 1, 6 cols/4 -> 2, 10/4 -> 3
        assert_eq!(wrapped_rows(&lines, 4), 8);
        assert_eq!(wrapped_rows(&lines, 0), 6 + 1 + 6 + 10);
    }

    #[test]
    fn transcript_shows_placeholder_while_waiting() {
        let messages = vec![ChatMessage::user("hi\nthere"), ChatMessage::assistant("")];
        let lines = transcript(&messages, true);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1].spans[0].content, "there");
        assert_eq!(lines[3].spans[1].content, "...");
        assert_eq!(transcript(&messages, false)[3].spans[1].content, "");
    }
}
