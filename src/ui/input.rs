use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Multi-line text buffer with a cursor, as used by the diary editor.
/// The cursor is a byte offset that always sits on a char boundary.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    content: String,
    cursor: usize,
}

impl TextInput {
    pub fn new(content: &str) -> Self {
        TextInput {
            content: content.to_string(),
            cursor: content.len(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn with_cursor_marker(&self, visible: bool) -> String {
        let mut shown = self.content.clone();
        if visible {
            shown.insert(self.cursor, '|');
        }
        shown
    }

    pub fn insert(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.content[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
            self.content.remove(self.cursor);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            self.content.remove(self.cursor);
        }
    }

    pub fn left(&mut self) {
        if let Some(prev) = self.content[..self.cursor].chars().next_back() {
            self.cursor -= prev.len_utf8();
        }
    }

    pub fn right(&mut self) {
        if let Some(next) = self.content[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    fn line_start(&self, at: usize) -> usize {
        self.content[..at].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    fn line_end(&self, at: usize) -> usize {
        self.content[at..]
            .find('\n')
            .map(|i| at + i)
            .unwrap_or(self.content.len())
    }

    /// Byte offset of the `column`-th char of the line starting at `start`,
    /// clamped to the line end.
    fn offset_in_line(&self, start: usize, column: usize) -> usize {
        let end = self.line_end(start);
        self.content[start..end]
            .char_indices()
            .nth(column)
            .map(|(i, _)| start + i)
            .unwrap_or(end)
    }

    fn column(&self) -> usize {
        let start = self.line_start(self.cursor);
        self.content[start..self.cursor].chars().count()
    }

    pub fn up(&mut self) {
        let start = self.line_start(self.cursor);
        if start == 0 {
            return;
        }
        let column = self.column();
        let prev_start = self.line_start(start - 1);
        self.cursor = self.offset_in_line(prev_start, column);
    }

    pub fn down(&mut self) {
        let end = self.line_end(self.cursor);
        if end == self.content.len() {
            return;
        }
        let column = self.column();
        self.cursor = self.offset_in_line(end + 1, column);
    }

    /// Applies an editing key. Returns false for keys it does not handle.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => self.insert(c),
            KeyCode::Enter => self.insert('\n'),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.left(),
            KeyCode::Right => self.right(),
            KeyCode::Up => self.up(),
            KeyCode::Down => self.down(),
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
}

impl Field {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        Field {
            label,
            value: value.into(),
            masked: false,
        }
    }

    pub fn masked(label: &'static str) -> Self {
        Field {
            label,
            value: String::new(),
            masked: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEvent {
    Continue,
    Submit,
    Cancel,
}

/// A stack of single-line fields edited one at a time.
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
    /// Show masked fields in clear text.
    pub reveal: bool,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        Form {
            fields,
            focus: 0,
            reveal: false,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields
            .get(index)
            .map(|f| f.value.as_str())
            .unwrap_or_default()
    }

    pub fn shown_value(&self, index: usize) -> String {
        match self.fields.get(index) {
            Some(field) if field.masked && !self.reveal => "•".repeat(field.value.chars().count()),
            Some(field) => field.value.clone(),
            None => String::new(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormEvent {
        let count = self.fields.len();
        match key.code {
            KeyCode::Esc => return FormEvent::Cancel,
            KeyCode::Enter if self.focus + 1 >= count => return FormEvent::Submit,
            KeyCode::Enter | KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % count,
            KeyCode::BackTab | KeyCode::Up => self.focus = (self.focus + count - 1) % count,
            KeyCode::F(2) => self.reveal = !self.reveal,
            KeyCode::Backspace => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.value.pop();
                }
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.value.push(c);
                }
            }
            _ => {}
        }
        FormEvent::Continue
    }
}
