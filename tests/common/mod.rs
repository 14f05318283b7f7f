#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

use async_trait::async_trait;
use spotshuffle::{
    error::SpotifyError,
    spotify::SpotifyApi,
    types::{
        Playback, PlaybackContext, PlaybackItem, PlaylistItem, PlaylistTracksPage, TrackRef,
    },
};
use tokio::time::Instant;

/// A remote call seen by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Name(String),
    Tracks(String, u32),
    Playback,
    Add(String, Vec<String>),
    Remove(String, Vec<String>),
    Reauthorize,
}

pub struct FakeState {
    /// Remote playlist contents.
    pub playlists: HashMap<String, Vec<String>>,
    pub names: HashMap<String, String>,
    pub playback: Option<Playback>,
    /// Returned, one per call, before `playback` is served.
    pub playback_errors: VecDeque<SpotifyError>,
    /// While false every playback query answers 401.
    pub credential_valid: bool,
    pub page_size: usize,
    pub fail_tracks: bool,
    /// Fails the page request at this offset only.
    pub fail_tracks_at: Option<u32>,
    pub fail_names: bool,
    pub fail_add: bool,
    pub fail_remove: bool,
    pub calls: Vec<Call>,
    pub playback_times: Vec<Instant>,
}

impl Default for FakeState {
    fn default() -> Self {
        FakeState {
            playlists: HashMap::new(),
            names: HashMap::new(),
            playback: None,
            playback_errors: VecDeque::new(),
            credential_valid: true,
            page_size: 100,
            fail_tracks: false,
            fail_tracks_at: None,
            fail_names: false,
            fail_add: false,
            fail_remove: false,
            calls: Vec::new(),
            playback_times: Vec::new(),
        }
    }
}

#[derive(Default)]
pub struct FakeSpotify {
    pub state: Mutex<FakeState>,
}

impl FakeSpotify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_playlist(self, id: &str, name: &str, tracks: &[&str]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state
                .playlists
                .insert(id.to_string(), tracks.iter().map(|t| t.to_string()).collect());
            state.names.insert(id.to_string(), name.to_string());
        }
        self
    }

    pub fn set_playback(&self, playback: Option<Playback>) {
        self.state.lock().unwrap().playback = playback;
    }

    pub fn set_remote_tracks(&self, id: &str, tracks: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .playlists
            .insert(id.to_string(), tracks.iter().map(|t| t.to_string()).collect());
    }

    pub fn remote_tracks(&self, id: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .playlists
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Add and remove calls, in order.
    pub fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Add(..) | Call::Remove(..)))
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn update(&self, f: impl FnOnce(&mut FakeState)) {
        f(&mut self.state.lock().unwrap());
    }
}

fn api_error(status: u16) -> SpotifyError {
    SpotifyError::Api {
        status,
        message: "fake failure".to_string(),
    }
}

#[async_trait]
impl SpotifyApi for FakeSpotify {
    async fn playlist_name(&self, playlist_id: &str) -> Result<String, SpotifyError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Name(playlist_id.to_string()));
        if state.fail_names {
            return Err(api_error(500));
        }
        state
            .names
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| api_error(404))
    }

    async fn playlist_tracks(
        &self,
        playlist_id: &str,
        offset: u32,
    ) -> Result<PlaylistTracksPage, SpotifyError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Tracks(playlist_id.to_string(), offset));
        if state.fail_tracks || state.fail_tracks_at == Some(offset) {
            return Err(api_error(502));
        }

        let tracks = state
            .playlists
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| api_error(404))?;
        let start = (offset as usize).min(tracks.len());
        let end = (start + state.page_size).min(tracks.len());

        Ok(PlaylistTracksPage {
            items: tracks[start..end]
                .iter()
                .map(|id| PlaylistItem {
                    track: Some(TrackRef {
                        id: Some(id.clone()),
                    }),
                })
                .collect(),
            next: (end < tracks.len()).then(|| format!("page-{}", end)),
        })
    }

    async fn current_playback(&self) -> Result<Option<Playback>, SpotifyError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Playback);
        state.playback_times.push(Instant::now());

        if !state.credential_valid {
            return Err(SpotifyError::Unauthorized);
        }
        if let Some(e) = state.playback_errors.pop_front() {
            return Err(e);
        }
        Ok(state.playback.clone())
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<(), SpotifyError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Add(playlist_id.to_string(), track_ids.to_vec()));
        if state.fail_add {
            return Err(api_error(500));
        }
        state
            .playlists
            .entry(playlist_id.to_string())
            .or_default()
            .extend(track_ids.iter().cloned());
        Ok(())
    }

    async fn remove_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Remove(playlist_id.to_string(), track_ids.to_vec()));
        if state.fail_remove {
            return Err(api_error(500));
        }
        if let Some(tracks) = state.playlists.get_mut(playlist_id) {
            tracks.retain(|id| !track_ids.contains(id));
        }
        Ok(())
    }

    async fn reauthorize(&self) -> Result<(), SpotifyError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Reauthorize);
        state.credential_valid = true;
        Ok(())
    }
}

/// Playback of `track_id` from `context_uri`.
pub fn playback(track_id: &str, context_uri: Option<&str>, is_playing: bool) -> Playback {
    Playback {
        is_playing,
        item: Some(PlaybackItem {
            id: Some(track_id.to_string()),
            name: format!("Track {}", track_id),
        }),
        context: context_uri.map(|uri| PlaybackContext {
            uri: uri.to_string(),
        }),
    }
}

/// Playback of `track_id` from playlist `playlist_id`.
pub fn playing_from(track_id: &str, playlist_id: &str) -> Playback {
    playback(
        track_id,
        Some(&format!("spotify:playlist:{}", playlist_id)),
        true,
    )
}
