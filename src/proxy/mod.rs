//! `POST /api/gemini`: forwards a prompt to Gemini with the server's key and
//! returns only the reply text.

use crate::config::ProxyConfig;
use axum::{
    http::Method,
    routing::post,
    Router,
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tracing::{info, warn};

pub mod error;
pub mod gemini;
mod routes;

pub use error::ProxyError;
pub use gemini::{extract_reply, GeminiClient};

#[derive(Debug, Clone)]
pub struct ProxyState {
    gemini: Option<Arc<GeminiClient>>,
    persona: Option<Arc<str>>,
}

impl ProxyState {
    pub fn from_config(config: &ProxyConfig) -> Self {
        let gemini = config
            .api_key()
            .map(|key| Arc::new(GeminiClient::new(&config.api_base, &config.model, key)));
        if gemini.is_none() {
            warn!("No Gemini API key set. Set GEMINI_API_KEY before using.");
        }
        ProxyState {
            gemini,
            persona: config.persona().map(Arc::from),
        }
    }

    /// The text actually sent upstream for `prompt`.
    pub fn compose_prompt(&self, prompt: &str) -> String {
        match &self.persona {
            Some(persona) => format!("{persona}\n\nUser: {prompt}"),
            None => prompt.to_string(),
        }
    }
}

pub fn router(state: ProxyState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(AllowHeaders::mirror_request());

    Router::new()
        .route("/api/gemini", post(routes::gemini_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(config: ProxyConfig) -> std::io::Result<()> {
    let state = ProxyState::from_config(&config);
    info!(model = %config.model, persona = config.persona().is_some(), "starting Gemini proxy");

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Gemini proxy running at http://localhost:{}", config.port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gemini proxy shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persona_is_prepended() {
        let mut config = ProxyConfig::new(Some("k".into()));
        config.system_prompt = Some("Be kind.".into());
        let state = ProxyState::from_config(&config);
        assert_eq!(state.compose_prompt("hello"), "Be kind.\n\nUser: hello");

        config.disable_persona = true;
        let state = ProxyState::from_config(&config);
        assert_eq!(state.compose_prompt("hello"), "hello");
    }
}
