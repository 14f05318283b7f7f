//! Error types shared across the crate.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while talking to Spotify or handling the cached credential.
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// The access token was rejected (HTTP 401).
    #[error("access token expired or revoked")]
    Unauthorized,

    /// Spotify asked us to slow down (HTTP 429).
    #[error("rate limit reached (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Any other non-success status.
    #[error("Spotify API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Token endpoint answered with something we cannot use.
    #[error("token error: {0}")]
    Token(String),

    /// No usable credential yet, the interactive authorization is still open.
    #[error("waiting for interactive authorization")]
    AuthorizationPending,

    /// A bounded retry loop gave up.
    #[error("still failing after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<SpotifyError>,
    },
}

impl SpotifyError {
    /// Builds an error from a non-success HTTP status and response body.
    ///
    /// Spotify wraps API errors as `{"error": {"status": .., "message": ..}}`
    /// and token endpoint errors as `{"error": .., "error_description": ..}`;
    /// both are unwrapped, anything else is kept verbatim.
    pub fn from_status(status: u16, body: &str, retry_after: Option<Duration>) -> Self {
        match status {
            401 => Self::Unauthorized,
            429 => Self::RateLimited { retry_after },
            _ => Self::Api {
                status,
                message: error_message(body),
            },
        }
    }

    /// True when the token endpoint refused the grant itself, as opposed to
    /// failing to answer.
    ///
    /// A rejected refresh token (`invalid_grant`, revoked client) needs a new
    /// interactive authorization. Network errors, rate limits and 5xx
    /// answers do not: the cached credential stays usable and the refresh
    /// can be tried again later.
    pub fn is_grant_rejected(&self) -> bool {
        match self {
            Self::Unauthorized | Self::Token(_) => true,
            Self::Api { status, .. } => (400..500).contains(status),
            _ => false,
        }
    }
}

fn error_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    if let Some(message) = json["error"]["message"].as_str() {
        return message.to_string();
    }
    if let Some(description) = json["error_description"].as_str() {
        return description.to_string();
    }
    if let Some(error) = json["error"].as_str() {
        return error.to_string();
    }
    body.trim().to_string()
}

/// Errors found while reading the process configuration. All of them are
/// fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is not set or empty")]
    Missing(&'static str),

    #[error("PLAYLIST_PAIRS is invalid: {0}")]
    InvalidPairs(String),

    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} is not a valid socket address: {value:?}")]
    InvalidAddress { key: &'static str, value: String },
}
