use std::collections::HashMap;

use tracing::{debug, error};

use crate::spotify::SpotifyApi;

/// In-memory playlist membership and playlist names.
///
/// Track lists are only refreshed on demand: once at startup for every
/// source playlist and again whenever an expected track is missing. Names
/// are fetched on first use and kept for the rest of the run.
#[derive(Debug, Default)]
pub struct PlaylistCache {
    tracks: HashMap<String, Vec<String>>,
    names: HashMap<String, String>,
}

impl PlaylistCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches every page of a playlist and replaces the cached list.
    ///
    /// The new list is only stored once all pages arrived. On error the
    /// previous entry (or its absence) stays as it was.
    ///
    /// # Arguments
    ///
    /// * `api` - Spotify access used for the page requests
    /// * `playlist_id` - playlist to list, usually a source playlist
    ///
    /// Errors are logged, not returned: a failed refresh only means the
    /// cache is as stale as before.
    pub async fn refresh<A>(&mut self, api: &A, playlist_id: &str)
    where
        A: SpotifyApi + ?Sized,
    {
        let mut tracks = Vec::new();
        let mut offset = 0;

        loop {
            let page = match api.playlist_tracks(playlist_id, offset).await {
                Ok(page) => page,
                Err(e) => {
                    error!("Error caching tracks for playlist {}: {}", playlist_id, e);
                    return;
                }
            };

            tracks.extend(page.track_ids().map(str::to_string));

            if page.next.is_none() || page.items.is_empty() {
                break;
            }
            offset += page.items.len() as u32;
        }

        debug!(
            "Cached {} tracks for playlist {}",
            tracks.len(),
            playlist_id
        );
        self.tracks.insert(playlist_id.to_string(), tracks);
    }

    pub fn contains(&self, playlist_id: &str, track_id: &str) -> bool {
        self.tracks
            .get(playlist_id)
            .is_some_and(|tracks| tracks.iter().any(|id| id == track_id))
    }

    /// Drops one occurrence of `track_id` from the cached list.
    pub fn remove(&mut self, playlist_id: &str, track_id: &str) {
        if let Some(tracks) = self.tracks.get_mut(playlist_id) {
            if let Some(pos) = tracks.iter().position(|id| id == track_id) {
                tracks.remove(pos);
            }
        }
    }

    /// Number of cached tracks, `None` if the playlist was never cached.
    pub fn len(&self, playlist_id: &str) -> Option<usize> {
        self.tracks.get(playlist_id).map(Vec::len)
    }

    pub fn tracks(&self, playlist_id: &str) -> Option<&[String]> {
        self.tracks.get(playlist_id).map(Vec::as_slice)
    }

    /// Returns the playlist's display name, fetching it on first use.
    ///
    /// Failures are logged and not cached, so a later call tries again.
    pub async fn get_name<A>(&mut self, api: &A, playlist_id: &str) -> Option<String>
    where
        A: SpotifyApi + ?Sized,
    {
        if let Some(name) = self.names.get(playlist_id) {
            return Some(name.clone());
        }

        match api.playlist_name(playlist_id).await {
            Ok(name) => {
                self.names.insert(playlist_id.to_string(), name.clone());
                Some(name)
            }
            Err(e) => {
                error!(
                    "Error retrieving playlist name for {}: {}",
                    playlist_id, e
                );
                None
            }
        }
    }

    /// Display name for log lines, falling back to the id.
    pub async fn label<A>(&mut self, api: &A, playlist_id: &str) -> String
    where
        A: SpotifyApi + ?Sized,
    {
        self.get_name(api, playlist_id)
            .await
            .unwrap_or_else(|| playlist_id.to_string())
    }
}
