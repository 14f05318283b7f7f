use chrono::Utc;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Seconds before the real expiry at which a token is treated as expired.
pub const TOKEN_EXPIRY_MARGIN: u64 = 240;

/// The persisted OAuth credential.
///
/// Field names follow the common Spotify token cache layout, so a cache file
/// written by other OAuth helpers can be reused as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub expires_in: u64,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub expires_at: u64,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Token {
    /// Builds a token from a token endpoint response. A refresh response may
    /// omit the refresh token, in which case `previous_refresh` is kept.
    pub fn from_response(response: TokenResponse, previous_refresh: Option<String>) -> Self {
        let obtained_at = Utc::now().timestamp().max(0) as u64;
        Token {
            access_token: response.access_token,
            token_type: response.token_type.unwrap_or_else(default_token_type),
            refresh_token: response.refresh_token.or(previous_refresh),
            scope: response.scope.unwrap_or_default(),
            expires_in: response.expires_in,
            expires_at: obtained_at + response.expires_in,
        }
    }

    pub fn is_expired(&self) -> bool {
        let now = Utc::now().timestamp().max(0) as u64;
        now + TOKEN_EXPIRY_MARGIN >= self.expires_at
    }
}

/// Raw body of the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

/// State of an authorization URL handed out and not yet completed.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub state: String,
    /// Present only for the PKCE flow.
    pub code_verifier: Option<String>,
}

/// A configured source/target playlist pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaylistPair {
    pub source_playlist_id: String,
    pub target_playlist_id: String,
}

/// `GET /me/player`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playback {
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub item: Option<PlaybackItem>,
    #[serde(default)]
    pub context: Option<PlaybackContext>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackItem {
    /// `None` for local files.
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackContext {
    pub uri: String,
}

impl PlaybackContext {
    /// Playlist id of a `spotify:playlist:<id>` or legacy
    /// `spotify:user:<user>:playlist:<id>` context.
    pub fn playlist_id(&self) -> Option<&str> {
        let mut parts = self.uri.rsplit(':');
        let id = parts.next()?;
        match parts.next() {
            Some("playlist") if !id.is_empty() => Some(id),
            _ => None,
        }
    }
}

impl Playback {
    /// The playing track, if it has an id.
    pub fn now_playing(&self) -> Option<NowPlaying> {
        let item = self.item.as_ref()?;
        Some(NowPlaying {
            id: item.id.clone()?,
            name: item.name.clone(),
        })
    }

    /// True when `playlist_id` drives playback and playback is not paused.
    pub fn is_playing_from(&self, playlist_id: &str) -> bool {
        self.is_playing
            && self
                .context
                .as_ref()
                .and_then(PlaybackContext::playlist_id)
                .is_some_and(|id| id == playlist_id)
    }
}

/// The track the poll loop works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    pub id: String,
    pub name: String,
}

/// `GET /playlists/{id}/tracks`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaylistTracksPage {
    #[serde(default)]
    pub items: Vec<PlaylistItem>,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    /// Null for tracks that are no longer available.
    #[serde(default)]
    pub track: Option<TrackRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackRef {
    pub id: Option<String>,
}

impl PlaylistTracksPage {
    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .filter_map(|item| item.track.as_ref()?.id.as_deref())
    }
}

/// `GET /playlists/{id}?fields=name`
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistName {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveTracksRequest {
    pub tracks: Vec<TrackUri>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackUri {
    pub uri: String,
}

pub fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{}", track_id)
}

#[derive(Tabled)]
pub struct PairTableRow {
    pub source: String,
    pub target: String,
    pub tracks: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(uri: &str) -> PlaybackContext {
        PlaybackContext {
            uri: uri.to_string(),
        }
    }

    #[test]
    fn parses_playlist_context_uris() {
        assert_eq!(context("spotify:playlist:abc").playlist_id(), Some("abc"));
        assert_eq!(
            context("spotify:user:someone:playlist:abc").playlist_id(),
            Some("abc")
        );
        assert_eq!(context("spotify:album:abc").playlist_id(), None);
        assert_eq!(context("spotify:playlist:").playlist_id(), None);
        assert_eq!(context("").playlist_id(), None);
    }

    #[test]
    fn refresh_response_keeps_previous_refresh_token() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "new", "expires_in": 3600}"#).unwrap();
        let token = Token::from_response(response, Some("old-refresh".to_string()));
        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(token.token_type, "Bearer");
        assert!(!token.is_expired());
    }

    #[test]
    fn reads_foreign_token_cache_layout() {
        let json = r#"{
            "access_token": "a",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "user-read-playback-state",
            "expires_at": 1,
            "refresh_token": "r"
        }"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.refresh_token.as_deref(), Some("r"));
        assert!(token.is_expired());
    }
}
