use super::{extract_reply, ProxyError, ProxyState};
use axum::{body::Bytes, extract::State, Json};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ProxyReply {
    pub reply: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Value>,
}

/// The body is read raw so a missing key is reported before any parsing.
pub async fn gemini_handler(
    State(state): State<ProxyState>,
    body: Bytes,
) -> Result<Json<ProxyReply>, ProxyError> {
    let gemini = state.gemini.as_ref().ok_or(ProxyError::MissingApiKey)?;
    let prompt = prompt_from_body(&body).ok_or(ProxyError::MissingPrompt)?;

    let data = gemini
        .generate(&state.compose_prompt(&prompt))
        .await
        .inspect_err(|e| {
            if let ProxyError::Transport(err) = e {
                tracing::error!("Gemini API error: {err}");
            }
        })?;

    match extract_reply(&data) {
        Some(reply) => Ok(Json(ProxyReply {
            reply: reply.to_string(),
            debug: None,
        })),
        None => {
            tracing::warn!(%data, "Unknown response from Gemini");
            Ok(Json(ProxyReply {
                reply: String::new(),
                debug: Some(data),
            }))
        }
    }
}

fn prompt_from_body(body: &[u8]) -> Option<String> {
    let parsed: Value = serde_json::from_slice(body).ok()?;
    parsed
        .get("prompt")?
        .as_str()
        .filter(|prompt| !prompt.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::prompt_from_body;

    #[test]
    fn prompt_must_be_a_non_empty_string() {
        assert_eq!(prompt_from_body(br#"{"prompt":"hi"}"#).as_deref(), Some("hi"));
        assert_eq!(prompt_from_body(br#"{}"#), None);
        assert_eq!(prompt_from_body(br#"{"prompt":""}"#), None);
        assert_eq!(prompt_from_body(br#"{"prompt":42}"#), None);
        assert_eq!(prompt_from_body(b"prompt=hi"), None);
        assert_eq!(prompt_from_body(b""), None);
    }
}
