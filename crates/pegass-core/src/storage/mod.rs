mod config;
pub mod session_store;

pub use config::{
    Config, CredentialsConfig, EndpointsConfig, HttpConfig, PaginationConfig, RosterConfig,
    SessionConfig, StatsConfig, SummaryConfig,
};
pub use session_store::{FileSessionStore, MemorySessionStore, SessionStore, SessionTicket};

use std::path::PathBuf;

/// Returns `~/.config/pegass[-dev]/` based on PEGASS_ENV.
///
/// Set PEGASS_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("PEGASS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pegass-dev")
    } else {
        base_dir.join("pegass")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
