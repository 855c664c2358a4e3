use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{fmt, EnvFilter};

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Logs to stdout, filtered by `RUST_LOG`.
pub fn init_stdout(default: &str) {
    fmt().with_env_filter(filter(default)).init();
}

/// Logs to an append-only file. The terminal client cannot log to stdout
/// while the alternate screen is active.
pub fn init_file(path: &Path, default: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    fmt()
        .with_env_filter(filter(default))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
