//! # Spotify Integration Module
//!
//! Everything that talks to Spotify: the OAuth flow and token endpoint calls
//! ([`auth`]) and the Web API client ([`client`]).
//!
//! ## The API seam
//!
//! The rest of the crate never calls reqwest directly. The playlist cache,
//! playback observer and relocation engine are written against the
//! [`SpotifyApi`] trait, which [`SpotifyClient`] implements over HTTP and the
//! tests implement with an in-memory fake.
//!
//! ## API Coverage
//!
//! - `GET /playlists/{id}` - playlist name
//! - `GET /playlists/{id}/tracks` - playlist items, 100 per page
//! - `GET /me/player` - current playback (204 when nothing plays)
//! - `POST /playlists/{id}/tracks` - append tracks
//! - `DELETE /playlists/{id}/tracks` - remove all occurrences of tracks
//! - `POST /api/token` - code exchange and token refresh
//!
//! ## Error Mapping
//!
//! - `401` -> [`SpotifyError::Unauthorized`]
//! - `429` -> [`SpotifyError::RateLimited`] with the `Retry-After` value
//! - any other non-2xx -> [`SpotifyError::Api`]
//!
//! Retrying is left to the callers; see [`crate::playback`].

use async_trait::async_trait;

use crate::{
    error::SpotifyError,
    types::{Playback, PlaylistTracksPage},
};

pub mod auth;
pub mod client;

pub use auth::{AuthStatus, Authorizer};
pub use client::SpotifyClient;

/// The Spotify operations the poller needs.
///
/// Implementations map HTTP failures onto [`SpotifyError`] as described in
/// the module docs and never retry on their own.
#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Display name of a playlist.
    ///
    /// # Arguments
    ///
    /// * `playlist_id` - bare Spotify playlist id
    ///
    /// # Errors
    ///
    /// `SpotifyError::Api` with status 404 for an unknown or private
    /// playlist, plus the common mapping.
    async fn playlist_name(&self, playlist_id: &str) -> Result<String, SpotifyError>;

    /// One page of playlist items starting at `offset`.
    ///
    /// Pages hold up to 100 items. Callers keep requesting with the offset
    /// advanced by the number of items received until `next` is `None` or a
    /// page comes back empty. Items without a track or track id (local
    /// files, removed tracks) are part of the page and skipped by
    /// [`PlaylistTracksPage::track_ids`].
    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
    ) -> Result<PlaylistTracksPage, SpotifyError>;

    /// Current playback state, `None` when the player is idle.
    ///
    /// # Errors
    ///
    /// - `SpotifyError::Unauthorized` - the access token was rejected
    /// - `SpotifyError::RateLimited` - carries the advised wait
    /// - `SpotifyError::AuthorizationPending` - no credential published yet
    async fn current_playback(&self) -> Result<Option<Playback>, SpotifyError>;

    /// Appends tracks to the end of a playlist.
    ///
    /// # Arguments
    ///
    /// * `playlist_id` - playlist to append to
    /// * `track_ids` - bare track ids, sent as `spotify:track:` URIs
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String])
    -> Result<(), SpotifyError>;

    /// Removes every occurrence of the tracks from a playlist.
    async fn remove_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError>;

    /// Obtains a fresh credential after a rejected request. Waits while the
    /// interactive authorization is pending.
    async fn reauthorize(&self) -> Result<(), SpotifyError>;
}
