use crate::api::DEFAULT_API_URL;
use clap::{Args, Parser};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_PORT: u16 = 3000;

/// Persona prepended to every prompt unless disabled or overridden.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are HeyBuddy, a compassionate and supportive mental health companion. Your role is to:
- Listen actively and with empathy to the user's concerns and feelings.
- Provide thoughtful, non-judgmental responses that validate their emotions.
- Offer practical coping strategies, grounding techniques, and suggestions for self-care.
- Encourage professional help when appropriate (e.g., for crisis situations, therapy, counseling).
- Maintain a warm, conversational tone while being mindful of mental health boundaries.
- IMPORTANT: If the user mentions suicidal thoughts, self-harm, or immediate danger, always encourage them to contact emergency services or the helpline: 14416.
- Never pretend to be a licensed therapist or provide medical advice.
- Be supportive, but honest about your limitations as an AI.";

#[derive(Debug, Clone, Parser)]
#[command(name = "heybuddy", version, about = "HeyBuddy terminal client")]
pub struct ClientConfig {
    /// Base URL of the HeyBuddy backend.
    #[arg(long, env = "HEYBUDDY_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Where the login session is kept between runs.
    #[arg(long, env = "HEYBUDDY_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Page to open first, e.g. `user-dashboard/diary`. Still guarded.
    #[arg(long, env = "HEYBUDDY_ROUTE")]
    pub route: Option<String>,

    /// Write logs here. Nothing is logged without it.
    #[arg(long, env = "HEYBUDDY_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl ClientConfig {
    pub fn session_path(&self) -> PathBuf {
        self.session_file.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("heybuddy")
                .join("session.json")
        })
    }
}

#[derive(Debug, Clone, Args)]
pub struct ProxyConfig {
    /// Gemini API key. `GOOGLE_API_KEY` is read when this is unset.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "MODEL_NAME", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Replaces the built-in persona.
    #[arg(long, env = "SYSTEM_PROMPT")]
    pub system_prompt: Option<String>,

    /// Forward prompts without any persona.
    #[arg(long, env = "DISABLE_PERSONA")]
    pub disable_persona: bool,

    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl ProxyConfig {
    pub fn new(api_key: Option<String>) -> Self {
        ProxyConfig {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            disable_persona: false,
            api_base: DEFAULT_API_BASE.to_string(),
            port: DEFAULT_PORT,
        }
    }

    /// Applies `GOOGLE_API_KEY` when no Gemini key was given.
    pub fn with_env_fallbacks(mut self) -> Self {
        if self.api_key().is_none() {
            self.api_key = std::env::var("GOOGLE_API_KEY").ok();
        }
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn persona(&self) -> Option<&str> {
        if self.disable_persona {
            return None;
        }
        Some(
            self.system_prompt
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or(DEFAULT_SYSTEM_PROMPT),
        )
    }
}
