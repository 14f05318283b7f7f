//! Configuration management for spotshuffle.
//!
//! All settings come from environment variables. `.env` files are loaded
//! first without overriding variables that are already set:
//! 1. Environment variables (highest priority)
//! 2. `.env` in the working directory
//! 3. `.env` in the local data directory (`spotshuffle/.env`)
//! 4. Application defaults (where applicable)
//!
//! Everything is read once at startup into [`Settings`]; a missing or
//! malformed required value is a [`ConfigError`] and the process must not
//! start.

use std::{env, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use crate::{error::ConfigError, types::PlaylistPair};

pub const DEFAULT_SLEEP_TIME: u64 = 20;
pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8888";
pub const DEFAULT_TOKEN_CACHE_PATH: &str = "./data/.spotify_cache";
pub const DEFAULT_LOG_FILE: &str = "./logs/spotshuffle.log";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

pub const SCOPE: &str = "user-library-read playlist-modify-public playlist-modify-private user-read-playback-state user-read-recently-played";

/// Loads `.env` files from the working directory and the local data
/// directory.
///
/// Missing files are ignored; the real environment always wins because
/// `dotenv` never overrides variables that are already set.
///
/// # Directory Structure
///
/// The second file is looked up in:
/// - Linux: `~/.local/share/spotshuffle/.env`
/// - macOS: `~/Library/Application Support/spotshuffle/.env`
/// - Windows: `%LOCALAPPDATA%/spotshuffle/.env`
pub fn load_env() {
    let _ = dotenv::dotenv();

    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("spotshuffle/.env");
    let _ = dotenv::from_path(path);
}

/// Returns the log file path from `LOG_FILE`.
///
/// Read separately from [`Settings`] so logging can be up before the rest of
/// the configuration is validated.
pub fn log_file() -> PathBuf {
    PathBuf::from(optional("LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()))
}

/// Everything the OAuth flow needs.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub client_id: String,
    /// `None` selects the PKCE flow.
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_url: String,
    pub token_url: String,
    pub server_addr: SocketAddr,
    pub token_cache: PathBuf,
}

/// The validated process configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub auth: AuthConfig,
    pub api_url: String,
    pub pairs: Vec<PlaylistPair>,
    pub sleep_time: Duration,
}

impl Settings {
    /// Reads and validates the configuration from the environment.
    ///
    /// # Errors
    ///
    /// - `CLIENT_ID`, `REDIRECT_URI` or `PLAYLIST_PAIRS` missing
    /// - `PLAYLIST_PAIRS` not a non-empty JSON list of pairs
    /// - `SLEEP_TIME` not a positive integer
    /// - `SERVER_ADDRESS` not a socket address
    pub fn from_env() -> Result<Self, ConfigError> {
        let pairs = parse_playlist_pairs(&required("PLAYLIST_PAIRS")?)?;
        let sleep_time = match optional("SLEEP_TIME") {
            Some(value) => parse_sleep_time(&value)?,
            None => Duration::from_secs(DEFAULT_SLEEP_TIME),
        };

        let server_addr = optional("SERVER_ADDRESS")
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());
        let server_addr =
            SocketAddr::from_str(&server_addr).map_err(|_| ConfigError::InvalidAddress {
                key: "SERVER_ADDRESS",
                value: server_addr.clone(),
            })?;

        let auth = AuthConfig {
            client_id: required("CLIENT_ID")?,
            client_secret: optional("CLIENT_SECRET"),
            redirect_uri: required("REDIRECT_URI")?,
            scope: SCOPE.to_string(),
            auth_url: optional("SPOTIFY_AUTH_URL").unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            token_url: optional("SPOTIFY_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string()),
            server_addr,
            token_cache: PathBuf::from(
                optional("TOKEN_CACHE_PATH")
                    .unwrap_or_else(|| DEFAULT_TOKEN_CACHE_PATH.to_string()),
            ),
        };

        Ok(Settings {
            auth,
            api_url: optional("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            pairs,
            sleep_time,
        })
    }
}

/// Parses the `PLAYLIST_PAIRS` value.
///
/// The value must be a JSON array of objects with exactly the keys
/// `source_playlist_id` and `target_playlist_id`. Each id may be a bare
/// playlist id, a `spotify:playlist:` URI or an `open.spotify.com` link.
///
/// # Example
///
/// ```
/// let pairs = parse_playlist_pairs(
///     r#"[{"source_playlist_id": "abc", "target_playlist_id": "def"}]"#,
/// )?;
/// ```
pub fn parse_playlist_pairs(raw: &str) -> Result<Vec<PlaylistPair>, ConfigError> {
    let pairs: Vec<PlaylistPair> =
        serde_json::from_str(raw).map_err(|e| ConfigError::InvalidPairs(e.to_string()))?;

    if pairs.is_empty() {
        return Err(ConfigError::InvalidPairs(
            "at least one pair is required".to_string(),
        ));
    }

    pairs
        .into_iter()
        .enumerate()
        .map(|(index, pair)| {
            Ok(PlaylistPair {
                source_playlist_id: normalize_playlist_id(&pair.source_playlist_id).ok_or_else(
                    || {
                        ConfigError::InvalidPairs(format!(
                            "pair {index}: invalid source_playlist_id {:?}",
                            pair.source_playlist_id
                        ))
                    },
                )?,
                target_playlist_id: normalize_playlist_id(&pair.target_playlist_id).ok_or_else(
                    || {
                        ConfigError::InvalidPairs(format!(
                            "pair {index}: invalid target_playlist_id {:?}",
                            pair.target_playlist_id
                        ))
                    },
                )?,
            })
        })
        .collect()
}

/// Reduces a playlist reference to its bare id.
///
/// Returns `None` for empty input or references that are not playlists.
pub fn normalize_playlist_id(raw: &str) -> Option<String> {
    let raw = raw.trim();

    let id = if let Some(rest) = raw.strip_prefix("spotify:") {
        let mut parts = rest.rsplit(':');
        let id = parts.next()?;
        if parts.next()? != "playlist" {
            return None;
        }
        id
    } else if raw.starts_with("http://") || raw.starts_with("https://") {
        let without_query = raw.split(['?', '#']).next()?;
        let mut segments = without_query.trim_end_matches('/').rsplit('/');
        let id = segments.next()?;
        if segments.next()? != "playlist" {
            return None;
        }
        id
    } else {
        raw
    };

    if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(id.to_string())
}

/// Parses `SLEEP_TIME` as whole seconds.
pub fn parse_sleep_time(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(ConfigError::InvalidNumber {
            key: "SLEEP_TIME",
            value: raw.to_string(),
        }),
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
