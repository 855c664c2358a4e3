//! Minimal client for the Generative Language `generateContent` call.

use super::error::ProxyError;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

impl<'a> GenerateRequest<'a> {
    fn single(text: &'a str) -> Self {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text }],
            }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_base: &str, model: &str, api_key: &str) -> Self {
        GeminiClient {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }

    /// Sends one single-turn request and returns the vendor body untouched.
    /// Bodies that are not JSON come back as a JSON string.
    pub async fn generate(&self, text: &str) -> Result<Value, ProxyError> {
        let response = self
            .http
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateRequest::single(text))
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), %body, "Gemini API error");
            return Err(ProxyError::Upstream { status, body });
        }
        Ok(body)
    }
}

/// `candidates[0].content.parts[0].text`, if every level is present and the
/// text is not empty.
pub fn extract_reply(body: &Value) -> Option<&str> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_shape() {
        let payload = serde_json::to_value(GenerateRequest::single("hi")).unwrap();
        assert_eq!(payload, json!({"contents": [{"parts": [{"text": "hi"}]}]}));
    }

    #[test]
    fn reply_extraction_tolerates_missing_levels() {
        let good = json!({"candidates": [{"content": {"parts": [{"text": "Hello!"}]}}]});
        assert_eq!(extract_reply(&good), Some("Hello!"));

        for body in [
            json!({}),
            json!({"candidates": []}),
            json!({"candidates": [{"finishReason": "SAFETY"}]}),
            json!({"candidates": [{"content": {"parts": []}}]}),
            json!({"candidates": [{"content": {"parts": [{"text": ""}]}}]}),
            json!({"candidates": [{"content": {"parts": [{"text": 7}]}}]}),
            json!("not an object"),
        ] {
            assert_eq!(extract_reply(&body), None, "{body}");
        }
    }

    #[test]
    fn endpoint_uses_model_and_trims_base() {
        let client = GeminiClient::new("http://vendor.test/", "gemini-2.0-flash", "k");
        assert_eq!(
            client.endpoint(),
            "http://vendor.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
