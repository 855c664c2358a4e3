//! Newline-delimited JSON decoding for the chat endpoint.
//!
//! A JSON object may span any number of network reads, so bytes are carried
//! over in [`LineSplitter`] until a newline completes the line. The carry
//! buffer holds raw bytes: a multi-byte UTF-8 character cut by a read boundary
//! is only decoded once the whole line has arrived.

use serde::Deserialize;

#[derive(Debug, Default, Clone)]
pub struct LineSplitter {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no newline.
    scanned: usize,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and returns every line completed by them, in order.
    /// Blank lines are dropped.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.buffer[from..].iter().position(|b| *b == b'\n') {
            let end = from + offset;
            if let Some(line) = decode_line(&self.buffer[start..end]) {
                lines.push(line);
            }
            start = end + 1;
            from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        lines
    }

    /// Returns the unterminated tail, if any, and resets the splitter.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        decode_line(&rest)
    }

    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// One object of the chat stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub alert: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatChunk {
    pub fn parse(line: &str) -> serde_json::Result<ChatChunk> {
        serde_json::from_str(line)
    }

    /// The crisis flag, which only counts on the terminal chunk.
    pub fn final_alert(&self) -> Option<bool> {
        if self.done {
            self.alert
        } else {
            None
        }
    }
}

/// [`LineSplitter`] plus per-line JSON parsing. Malformed lines are logged
/// and skipped so one bad line never ends the stream.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    lines: LineSplitter,
    skipped: usize,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, bytes: &[u8]) -> Vec<ChatChunk> {
        let lines = self.lines.feed(bytes);
        lines.iter().filter_map(|line| self.parse(line)).collect()
    }

    pub fn finish(&mut self) -> Option<ChatChunk> {
        let line = self.lines.finish()?;
        self.parse(&line)
    }

    /// Number of lines dropped because they were not valid chunks.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn parse(&mut self, line: &str) -> Option<ChatChunk> {
        match ChatChunk::parse(line) {
            Ok(chunk) => {
                if let Some(error) = &chunk.error {
                    tracing::warn!(%error, "chat stream reported an error");
                }
                Some(chunk)
            }
            Err(e) => {
                self.skipped += 1;
                tracing::warn!(%line, error = %e, "failed to parse chunk");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_partial_lines_between_reads() {
        let mut splitter = LineSplitter::new();
        let head = b"{\"text\":\"he";
        assert!(splitter.feed(head).is_empty());
        assert_eq!(splitter.pending_bytes(), head.len());
        assert_eq!(
            splitter.feed(b"llo\"}\n{\"text\":\" there\"}\n{\"do"),
            vec![r#"{"text":"hello"}"#, r#"{"text":" there"}"#]
        );
        assert_eq!(splitter.feed(b"ne\":true}\n"), vec![r#"{"done":true}"#]);
        assert_eq!(splitter.pending_bytes(), 0);
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn blank_lines_and_crlf_are_ignored() {
        let mut splitter = LineSplitter::new();
        assert_eq!(splitter.feed(b"\n\r\n  \na\r\nb\n"), vec!["a", "b"]);
    }

    #[test]
    fn multibyte_characters_split_across_reads() {
        let line = "{\"text\":\"calm 🌿 día\"}\n".as_bytes();
        let leaf = line.iter().position(|b| *b == 0xF0).unwrap();

        let mut splitter = LineSplitter::new();
        assert!(splitter.feed(&line[..leaf + 2]).is_empty());
        let lines = splitter.feed(&line[leaf + 2..]);
        assert_eq!(lines, vec!["{\"text\":\"calm 🌿 día\"}"]);
    }

    #[test]
    fn long_line_fed_bytewise_is_scanned_once() {
        let line = format!("{{\"text\":\"{}\"}}\nnext", "x".repeat(4096));
        let mut splitter = LineSplitter::new();
        let mut lines = Vec::new();
        for (i, byte) in line.as_bytes().iter().enumerate() {
            lines.extend(splitter.feed(std::slice::from_ref(byte)));
            assert_eq!(splitter.scanned, splitter.pending_bytes(), "after byte {i}");
        }
        assert_eq!(lines, vec![line[..line.len() - 5].to_string()]);
        assert_eq!(splitter.pending_bytes(), "next".len());

        assert_eq!(splitter.feed(b"\nlast"), vec!["next"]);
        assert_eq!(splitter.scanned, "last".len());
        assert_eq!(splitter.finish().as_deref(), Some("last"));
        assert_eq!(splitter.scanned, 0);
    }

    #[test]
    fn finish_returns_unterminated_tail() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.feed(b"{\"text\":\"tail\"}").is_empty());
        assert_eq!(splitter.finish().as_deref(), Some(r#"{"text":"tail"}"#));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn decoder_skips_malformed_lines() {
        let mut decoder = ChunkDecoder::new();
        let chunks = decoder.feed(b"{\"text\":\"a\"}\nnot json\n{\"text\":\"b\"}\n");
        assert_eq!(
            chunks.iter().filter_map(|c| c.text.as_deref()).collect::<Vec<_>>(),
            vec!["a", "b"]
        );
        assert_eq!(decoder.skipped(), 1);
    }

    #[test]
    fn alert_only_counts_on_done_chunk() {
        let early = ChatChunk::parse(r#"{"text":"x","alert":true}"#).unwrap();
        assert_eq!(early.final_alert(), None);

        let last = ChatChunk::parse(r#"{"text":"","done":true,"alert":true}"#).unwrap();
        assert_eq!(last.final_alert(), Some(true));
    }
}
