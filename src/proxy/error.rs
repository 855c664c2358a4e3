use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Server not configured: missing GEMINI_API_KEY")]
    MissingApiKey,

    #[error("Missing prompt string in request body")]
    MissingPrompt,

    #[error("Gemini returned {status}")]
    Upstream { status: StatusCode, body: Value },

    #[error("Gemini request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, error) = match self {
            ProxyError::MissingApiKey => (StatusCode::INTERNAL_SERVER_ERROR, json!(message)),
            ProxyError::MissingPrompt => (StatusCode::BAD_REQUEST, json!(message)),
            ProxyError::Upstream { status, body } => (status, body),
            ProxyError::Transport(_) => (StatusCode::INTERNAL_SERVER_ERROR, json!("Unknown Error")),
        };

        (status, Json(json!({ "error": error }))).into_response()
    }
}
