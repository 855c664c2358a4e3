//! HeyBuddy, a mental-health companion.
//!
//! The library holds everything the two binaries share: the session store,
//! the route guard, backend clients, the streaming chat consumer and the
//! Gemini proxy.

pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod proxy;
pub mod session;
pub mod stream;
pub mod telemetry;
pub mod ui;
