use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header::RETRY_AFTER};
use tracing::info;

use crate::{
    error::SpotifyError,
    spotify::{
        SpotifyApi,
        auth::{AuthStatus, Authorizer},
    },
    types::{
        AddTracksRequest, Playback, PlaylistName, PlaylistTracksPage, RemoveTracksRequest,
        TrackUri, track_uri,
    },
};

/// Largest page Spotify serves for playlist items.
pub const PLAYLIST_PAGE_LIMIT: u32 = 100;

/// [`SpotifyApi`] over the Spotify Web API.
///
/// Every request carries the token currently published by the
/// [`Authorizer`].
pub struct SpotifyClient {
    http: Client,
    api_url: String,
    authorizer: Arc<Authorizer>,
}

impl SpotifyClient {
    pub fn new(http: Client, api_url: impl Into<String>, authorizer: Arc<Authorizer>) -> Self {
        SpotifyClient {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            authorizer,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Sends an authorized request and maps error statuses.
    async fn send(&self, request: RequestBuilder) -> Result<Response, SpotifyError> {
        let token = self.authorizer.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = retry_after(&response);
        let body = response.text().await.unwrap_or_default();
        Err(SpotifyError::from_status(status.as_u16(), &body, retry_after))
    }
}

/// Parses a `Retry-After` header given in seconds.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn playlist_name(&self, playlist_id: &str) -> Result<String, SpotifyError> {
        let request = self
            .http
            .get(self.url(&format!("/playlists/{}", playlist_id)))
            .query(&[("fields", "name")]);

        let playlist = self.send(request).await?.json::<PlaylistName>().await?;
        Ok(playlist.name)
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
    ) -> Result<PlaylistTracksPage, SpotifyError> {
        let request = self
            .http
            .get(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .query(&[
                ("fields", "items(track(id)),next".to_string()),
                ("limit", PLAYLIST_PAGE_LIMIT.to_string()),
                ("offset", offset.to_string()),
            ]);

        Ok(self.send(request).await?.json().await?)
    }

    async fn current_playback(&self) -> Result<Option<Playback>, SpotifyError> {
        let request = self.http.get(self.url("/me/player"));
        let response = self.send(request).await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), SpotifyError> {
        let body = AddTracksRequest {
            uris: track_ids.iter().map(|id| track_uri(id)).collect(),
        };
        let request = self
            .http
            .post(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .json(&body);

        self.send(request).await?;
        Ok(())
    }

    async fn remove_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError> {
        let body = RemoveTracksRequest {
            tracks: track_ids
                .iter()
                .map(|id| TrackUri { uri: track_uri(id) })
                .collect(),
        };
        let request = self
            .http
            .delete(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .json(&body);

        self.send(request).await?;
        Ok(())
    }

    async fn reauthorize(&self) -> Result<(), SpotifyError> {
        if self.authorizer.authenticate().await == AuthStatus::Pending {
            info!("Waiting for Spotify authentication...");
            self.authorizer.wait_ready().await?;
        }
        Ok(())
    }
}
