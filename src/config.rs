//! Configuration management for spotreview.
//!
//! Configuration values come from environment variables, optionally seeded from
//! a `.env` file in the local data directory. The lookup order is:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (endpoint URLs, timeouts, file locations)
//!
//! Client credentials, the redirect URI and the requested scopes have no
//! defaults; everything else does.

use std::{env, path::PathBuf, time::Duration};

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8888";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the `spotreview` data directory if it doesn't exist yet and loads
/// `spotreview/.env` from it. A missing `.env` file is not an error, the
/// process environment alone may carry the configuration.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/spotreview/.env`
/// - macOS: `~/Library/Application Support/spotreview/.env`
/// - Windows: `%LOCALAPPDATA%/spotreview/.env`
///
/// # Errors
///
/// Fails if the data directory cannot be created or the `.env` file exists
/// but cannot be parsed.
pub async fn load_env() -> Result<()> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    }
    Ok(())
}

/// Root of everything spotreview keeps on disk.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotreview");
    path
}

/// Returns the address the OAuth callback server binds to.
///
/// Reads `SERVER_ADDRESS`, e.g. `127.0.0.1:8888`. The port must match the
/// redirect URI registered with Spotify.
pub fn server_addr() -> String {
    env::var("SERVER_ADDRESS").unwrap_or_else(|_| DEFAULT_SERVER_ADDRESS.to_string())
}

/// Location of the review ledger CSV.
///
/// `SPOTREVIEW_LEDGER` overrides the default of
/// `<data dir>/spotreview/reviewed_tracks.csv`.
pub fn ledger_path() -> PathBuf {
    match env::var("SPOTREVIEW_LEDGER") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
        _ => data_dir().join("reviewed_tracks.csv"),
    }
}

/// Everything the Spotify client needs to authenticate and reach the API.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Space separated scope list, e.g. `user-follow-read playlist-modify-private`.
    pub scopes: String,
    /// Pre-existing refresh token, skips the interactive authorization.
    pub refresh_token: Option<String>,
    pub api_url: String,
    pub auth_url: String,
    pub token_url: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl SpotifyConfig {
    /// Builds a configuration pointing at the public Spotify endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes: scopes.into(),
            refresh_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Required Variables
    ///
    /// - `SPOTIFY_API_AUTH_CLIENT_ID`
    /// - `SPOTIFY_API_AUTH_CLIENT_SECRET`
    /// - `SPOTIFY_API_REDIRECT_URI`
    /// - `SPOTIFY_API_AUTH_SCOPE`
    ///
    /// # Optional Variables
    ///
    /// - `SPOTIFY_REFRESH_TOKEN` - skip the interactive authorization
    /// - `SPOTIFY_API_URL`, `SPOTIFY_API_AUTH_URL`, `SPOTIFY_API_TOKEN_URL`
    /// - `SPOTREVIEW_TIMEOUT_SECS` - per request timeout (default 30)
    /// - `SPOTREVIEW_MAX_RETRIES` - retries for transient failures (default 3)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first missing or malformed variable.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            required("SPOTIFY_API_AUTH_CLIENT_ID")?,
            required("SPOTIFY_API_AUTH_CLIENT_SECRET")?,
            required("SPOTIFY_API_REDIRECT_URI")?,
            required("SPOTIFY_API_AUTH_SCOPE")?,
        );

        config.refresh_token = optional("SPOTIFY_REFRESH_TOKEN");
        if let Some(url) = optional("SPOTIFY_API_URL") {
            config.api_url = url;
        }
        if let Some(url) = optional("SPOTIFY_API_AUTH_URL") {
            config.auth_url = url;
        }
        if let Some(url) = optional("SPOTIFY_API_TOKEN_URL") {
            config.token_url = url;
        }
        if let Some(secs) = parsed::<u64>("SPOTREVIEW_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parsed::<u32>("SPOTREVIEW_MAX_RETRIES")? {
            config.max_retries = retries;
        }

        Ok(config)
    }
}

fn required(key: &str) -> Result<String> {
    optional(key).ok_or_else(|| Error::Config(format!("{} must be set", key)))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(None),
    }
}
