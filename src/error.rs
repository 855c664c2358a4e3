use thiserror::Error;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("{0}")]
    Validation(String),
}

impl ClientError {
    /// Message suitable for showing to the user in a status line.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}
