//! Chat conversations as the client sees them.
//!
//! A [`Conversation`] owns the message list. While a reply streams in, the
//! assistant message created at send time is the only one that changes, and
//! it only ever grows.

use crate::api::{ApiClient, ByteStream};
use crate::error::{ClientError, Result};
use crate::models::ChatMessage;
use crate::stream::ChunkDecoder;
use futures::{Stream, StreamExt};
use std::future::Future;

pub const GREETING: &str = "Hi — I'm HeyBuddy. How are you feeling today? You can chat with me or press Ctrl+J for a joke and a quick mood boost.";
pub const DIARY_GREETING: &str =
    "Ask me anything about your diary entries. I will only use your diary entries to answer.";
pub const APOLOGY: &str = "Sorry, I'm having trouble reaching the server. Please try again later.";
pub const CRISIS_WARNING: &str = "It seems you may need immediate support. Please consider contacting local emergency services or a mental health professional.";
pub const DIARY_CHAT_FAILURE: &str = "Error contacting server.";

/// Opens the streaming chat endpoint.
pub trait ChatTransport {
    fn open_chat(
        &self,
        message: &str,
        history: &[ChatMessage],
    ) -> impl Future<Output = Result<ByteStream>>;
}

impl ChatTransport for ApiClient {
    async fn open_chat(&self, message: &str, history: &[ChatMessage]) -> Result<ByteStream> {
        self.chat_stream(message, history).await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamOutcome {
    /// Crisis flag carried by the terminal chunk.
    pub alert: bool,
    pub chunks: usize,
    pub skipped: usize,
}

/// Reads `stream` to the end, handing every text fragment to `on_text` in
/// arrival order.
pub async fn consume_stream<S, B>(mut stream: S, mut on_text: impl FnMut(&str)) -> Result<StreamOutcome>
where
    S: Stream<Item = Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    let mut decoder = ChunkDecoder::new();
    let mut outcome = StreamOutcome::default();

    let mut apply = |chunk: crate::stream::ChatChunk, outcome: &mut StreamOutcome| {
        outcome.chunks += 1;
        if let Some(text) = chunk.text.as_deref().filter(|t| !t.is_empty()) {
            on_text(text);
        }
        if let Some(alert) = chunk.final_alert() {
            outcome.alert = alert;
        }
    };

    while let Some(bytes) = stream.next().await {
        for chunk in decoder.feed(bytes?.as_ref()) {
            apply(chunk, &mut outcome);
        }
    }
    if let Some(chunk) = decoder.finish() {
        apply(chunk, &mut outcome);
    }

    outcome.skipped = decoder.skipped();
    Ok(outcome)
}

pub enum ChatEvent<'a> {
    /// The message list changed; redraw it.
    Updated(&'a [ChatMessage]),
    /// Blocking warning to show once the reply is complete.
    Alert(&'static str),
}

#[derive(Debug)]
pub enum SendResult {
    /// Blank input, or a reply is still streaming.
    Ignored,
    Completed(StreamOutcome),
    /// The assistant message now holds [`APOLOGY`].
    Failed(ClientError),
}

#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    loading: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Conversation::with_greeting(GREETING)
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(greeting: &str) -> Self {
        Conversation {
            messages: vec![ChatMessage::assistant(greeting)],
            loading: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::assistant(content));
    }

    /// Sends `input` and streams the reply into a fresh assistant message.
    /// `on_event` sees every visible change, and the crisis alert at most
    /// once, after the stream has ended.
    pub async fn send<T, F>(&mut self, transport: &T, input: &str, mut on_event: F) -> SendResult
    where
        T: ChatTransport,
        F: FnMut(ChatEvent<'_>),
    {
        let text = input.trim();
        if text.is_empty() || self.loading {
            return SendResult::Ignored;
        }

        self.messages.push(ChatMessage::user(text));
        let history = self.messages.clone();
        let reply_index = self.messages.len();
        self.messages.push(ChatMessage::assistant(""));
        self.loading = true;
        on_event(ChatEvent::Updated(&self.messages));

        let result = match transport.open_chat(text, &history).await {
            Ok(stream) => {
                let messages = &mut self.messages;
                consume_stream(stream, |fragment| {
                    messages[reply_index].content.push_str(fragment);
                    on_event(ChatEvent::Updated(messages));
                })
                .await
            }
            Err(e) => Err(e),
        };
        self.loading = false;

        match result {
            Ok(outcome) => {
                tracing::debug!(chunks = outcome.chunks, skipped = outcome.skipped, "reply complete");
                on_event(ChatEvent::Updated(&self.messages));
                if outcome.alert {
                    tracing::warn!("crisis alert raised by backend");
                    on_event(ChatEvent::Alert(CRISIS_WARNING));
                }
                SendResult::Completed(outcome)
            }
            Err(e) => {
                tracing::error!(error = %e, "chat request failed");
                self.messages[reply_index].content = APOLOGY.to_string();
                on_event(ChatEvent::Updated(&self.messages));
                SendResult::Failed(e)
            }
        }
    }

    /// Asks the diary-grounded endpoint. Answers arrive whole, not streamed.
    pub async fn ask_diary(&mut self, client: &ApiClient, user_id: i64, input: &str) -> SendResult {
        let question = input.trim();
        if question.is_empty() || self.loading {
            return SendResult::Ignored;
        }
        self.messages.push(ChatMessage::user(question));
        self.loading = true;

        let result = client
            .rag_chat(user_id, question, crate::api::DEFAULT_TOP_K)
            .await;
        self.loading = false;

        match result {
            Ok(answer) => {
                self.push_assistant(answer);
                SendResult::Completed(StreamOutcome::default())
            }
            Err(e) => {
                tracing::error!(error = %e, "diary chat failed");
                let reply = match &e {
                    ClientError::Api { detail, .. } => detail.clone(),
                    _ => DIARY_CHAT_FAILURE.to_string(),
                };
                self.push_assistant(reply);
                SendResult::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn split_at(body: &[u8], cuts: &[usize]) -> Vec<Result<Vec<u8>>> {
        let mut pieces = Vec::new();
        let mut start = 0;
        for &cut in cuts {
            let cut = cut.min(body.len());
            if cut > start {
                pieces.push(Ok(body[start..cut].to_vec()));
                start = cut;
            }
        }
        pieces.push(Ok(body[start..].to_vec()));
        pieces
    }

    const BODY: &str = concat!(
        "{\"text\":\"I hear \",\"done\":false}\n",
        "{\"text\":\"you. Tell me \",\"done\":false}\n",
        "{\"text\":\"more — ça va?\",\"done\":false}\n",
        "{\"text\":\"\",\"done\":true,\"alert\":false}\n",
    );

    #[tokio::test]
    async fn reassembly_is_independent_of_split_points() {
        let expected = "I hear you. Tell me more — ça va?";
        let body = BODY.as_bytes();

        for step in 1..=body.len() {
            let cuts: Vec<usize> = (step..body.len()).step_by(step).collect();
            let mut text = String::new();
            let outcome = consume_stream(stream::iter(split_at(body, &cuts)), |t| text.push_str(t))
                .await
                .unwrap();
            assert_eq!(text, expected, "split every {step} bytes");
            assert!(!outcome.alert);
            assert_eq!(outcome.chunks, 4);
        }
    }

    #[tokio::test]
    async fn malformed_line_does_not_stop_the_stream() {
        let body = "{\"text\":\"one \"}\n{broken\n{\"text\":\"two\"}\n";
        let mut text = String::new();
        let outcome = consume_stream(stream::iter(split_at(body.as_bytes(), &[5, 20])), |t| {
            text.push_str(t)
        })
        .await
        .unwrap();
        assert_eq!(text, "one two");
        assert_eq!(outcome.skipped, 1);
    }

    struct Scripted {
        body: Option<&'static str>,
        fail_after: bool,
    }

    impl ChatTransport for Scripted {
        async fn open_chat(&self, _message: &str, history: &[ChatMessage]) -> Result<ByteStream> {
            assert_eq!(history.last().map(|m| m.role), Some(crate::models::ChatRole::User));
            let Some(body) = self.body else {
                return Err(ClientError::Api {
                    status: 502,
                    detail: "bad gateway".into(),
                });
            };
            let mut pieces: Vec<Result<Vec<u8>>> = body
                .as_bytes()
                .chunks(7)
                .map(|c| Ok(c.to_vec()))
                .collect();
            if self.fail_after {
                pieces.push(Err(ClientError::Validation("connection reset".into())));
            }
            Ok(stream::iter(pieces).boxed())
        }
    }

    #[tokio::test]
    async fn alert_fires_once_after_completion() {
        let transport = Scripted {
            body: Some(concat!(
                "{\"text\":\"Please stay safe.\",\"done\":false}\n",
                "{\"text\":\"\",\"done\":true,\"alert\":true}\n",
            )),
            fail_after: false,
        };
        let mut conversation = Conversation::new();
        let mut events = Vec::new();

        let result = conversation
            .send(&transport, "  I feel hopeless  ", |event| match event {
                ChatEvent::Updated(messages) => {
                    events.push(format!("update:{}", messages.last().unwrap().content))
                }
                ChatEvent::Alert(message) => events.push(format!("alert:{message}")),
            })
            .await;

        assert!(matches!(result, SendResult::Completed(StreamOutcome { alert: true, .. })));
        let alerts: Vec<_> = events.iter().filter(|e| e.starts_with("alert:")).collect();
        assert_eq!(alerts.len(), 1);
        assert_eq!(events.last().unwrap(), &format!("alert:{CRISIS_WARNING}"));

        let messages = conversation.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1], ChatMessage::user("I feel hopeless"));
        assert_eq!(messages[2], ChatMessage::assistant("Please stay safe."));
        assert!(!conversation.is_loading());
    }

    #[tokio::test]
    async fn failures_replace_reply_with_apology() {
        for transport in [
            Scripted { body: None, fail_after: false },
            Scripted { body: Some("{\"text\":\"partial\"}\n"), fail_after: true },
        ] {
            let mut conversation = Conversation::new();
            let mut alerted = false;
            let result = conversation
                .send(&transport, "hello", |event| {
                    if let ChatEvent::Alert(_) = event {
                        alerted = true;
                    }
                })
                .await;

            assert!(matches!(result, SendResult::Failed(_)));
            assert!(!alerted);
            assert_eq!(conversation.messages().last().unwrap().content, APOLOGY);
        }
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let transport = Scripted { body: Some(""), fail_after: false };
        let mut conversation = Conversation::new();
        let result = conversation.send(&transport, "   ", |_| {}).await;
        assert!(matches!(result, SendResult::Ignored));
        assert_eq!(conversation.messages().len(), 1);
    }
}
