//! Configuration management for the Spotify library exporter.
//!
//! This module handles loading and accessing configuration values from
//! environment variables and a `.env` file. It provides a centralized way to
//! manage application configuration including Spotify API credentials,
//! endpoint URLs, and the authorization wait-loop parameters.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

/// Placeholder prefix used to detect an unconfigured client id.
const CLIENT_ID_PLACEHOLDER: &str = "your-client-id";

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the directory structure if it doesn't exist and loads variables
/// from `spotexport/.env` under the platform-specific local data directory:
/// - Linux: `~/.local/share/spotexport/.env`
/// - macOS: `~/Library/Application Support/spotexport/.env`
/// - Windows: `%LOCALAPPDATA%/spotexport/.env`
///
/// A missing `.env` file is not an error; configuration may come entirely
/// from the process environment.
pub async fn load_env() {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotexport/.env");
    if let Some(parent) = path.parent() {
        let _ = async_fs::create_dir_all(parent).await;
    }

    if path.is_file() {
        let _ = dotenv::from_path(path);
    }
}

/// Returns the Spotify API client id, or an empty string when unset.
///
/// Validation (empty or still the placeholder from `.env.example`) happens
/// at the start of the authorization flow, which reports a configuration
/// error instead of panicking here.
pub fn spotify_client_id() -> String {
    env::var("SPOTIFY_API_AUTH_CLIENT_ID").unwrap_or_default()
}

/// Returns true when the configured client id is missing or a placeholder.
pub fn client_id_is_placeholder(client_id: &str) -> bool {
    client_id.trim().is_empty() || client_id.starts_with(CLIENT_ID_PLACEHOLDER)
}

/// Returns the OAuth redirect URI registered for the application.
///
/// The local callback server binds to the host, port and path of this URI.
pub fn spotify_redirect_uri() -> String {
    env::var("SPOTIFY_API_REDIRECT_URI")
        .unwrap_or_else(|_| "http://127.0.0.1:8721/callback".to_string())
}

/// Returns the OAuth scope string requested during authorization.
pub fn spotify_scope() -> String {
    env::var("SPOTIFY_API_AUTH_SCOPE").unwrap_or_else(|_| {
        "user-library-read playlist-read-private playlist-read-collaborative".to_string()
    })
}

/// Returns the Spotify OAuth authorization URL.
pub fn spotify_apiauth_url() -> String {
    env::var("SPOTIFY_API_AUTH_URL")
        .unwrap_or_else(|_| "https://accounts.spotify.com/authorize".to_string())
}

/// Returns the Spotify OAuth token exchange URL.
pub fn spotify_apitoken_url() -> String {
    env::var("SPOTIFY_API_TOKEN_URL")
        .unwrap_or_else(|_| "https://accounts.spotify.com/api/token".to_string())
}

/// Returns the Spotify Web API base URL.
pub fn spotify_apiurl() -> String {
    env::var("SPOTIFY_API_URL").unwrap_or_else(|_| "https://api.spotify.com/v1".to_string())
}

/// Returns the interval at which the orchestrator polls the callback slot.
///
/// Configured via `AUTH_POLL_INTERVAL_MS`, default 250 ms.
pub fn auth_poll_interval() -> Duration {
    let millis = env::var("AUTH_POLL_INTERVAL_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(250);
    Duration::from_millis(millis)
}

/// Returns the total wall-clock budget for one authorization attempt.
///
/// Configured via `AUTH_TIMEOUT_SECS`, default 300 s.
pub fn auth_timeout() -> Duration {
    let secs = env::var("AUTH_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(300);
    Duration::from_secs(secs)
}
