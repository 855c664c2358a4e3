use super::{ensure_success, ApiClient, ByteStream};
use crate::error::{ClientError, Result};
use crate::models::{detail_to_string, ChatMessage, RagAnswer, RagQuery};
use futures::StreamExt;
use reqwest::Method;
use serde::Serialize;

pub const DEFAULT_TOP_K: u32 = 5;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    history: &'a [ChatMessage],
}

impl ApiClient {
    /// Opens `POST /chat/chat` and hands back the body as it streams in.
    pub async fn chat_stream(&self, message: &str, history: &[ChatMessage]) -> Result<ByteStream> {
        let response = self
            .request(Method::POST, "/chat/chat")
            .json(&ChatRequest { message, history })
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(ClientError::from))
            .boxed())
    }

    /// Asks a question answered only from the user's diary entries.
    pub async fn rag_chat(&self, user_id: i64, question: &str, top_k: u32) -> Result<String> {
        let response = self
            .request(Method::POST, "/rag/chat")
            .json(&RagQuery {
                user_id,
                question,
                top_k,
            })
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body: RagAnswer = serde_json::from_slice(&bytes)?;

        match (status.is_success(), body.answer) {
            (true, Some(answer)) => Ok(answer),
            _ => Err(ClientError::Api {
                status: status.as_u16(),
                detail: body
                    .detail
                    .as_ref()
                    .map(detail_to_string)
                    .unwrap_or_else(|| "Failed to get answer".to_string()),
            }),
        }
    }
}
