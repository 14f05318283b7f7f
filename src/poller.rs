//! The poll loop.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{error, info};

use crate::{
    error::SpotifyError, management::PlaylistCache, playback, relocation, spotify::SpotifyApi,
    types::PlaylistPair,
};

/// Wait after a failed tick.
pub const ERROR_COOLDOWN: Duration = Duration::from_secs(60);

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is playing.
    Idle,
    /// The playing track was already handled.
    Unchanged,
    /// Every pair was checked against the playing track.
    Processed { moved: bool },
}

/// Polls playback and relocates tracks, one tick at a time.
///
/// The poller remembers the last track it processed and whether anything
/// was moved for it, so a track that keeps playing is handled once. All
/// pairs are checked in one tick; a tick finishes before the next starts.
///
/// # Example
///
/// ```
/// let client = Arc::new(SpotifyClient::new(http, settings.api_url, authorizer));
/// Poller::new(client, settings.pairs, settings.sleep_time)
///     .run()
///     .await;
/// ```
pub struct Poller<A: SpotifyApi + ?Sized> {
    api: Arc<A>,
    cache: PlaylistCache,
    pairs: Vec<PlaylistPair>,
    interval: Duration,
    cooldown: Duration,
    last_track_id: Option<String>,
    moved: bool,
}

impl<A: SpotifyApi + ?Sized> Poller<A> {
    /// Creates a poller with an empty cache.
    ///
    /// # Arguments
    ///
    /// * `api` - Spotify access shared with nothing else in the loop
    /// * `pairs` - source/target pairs, checked in this order on every tick
    /// * `interval` - wait after a successful tick (`SLEEP_TIME`)
    pub fn new(api: Arc<A>, pairs: Vec<PlaylistPair>, interval: Duration) -> Self {
        Poller {
            api,
            cache: PlaylistCache::new(),
            pairs,
            interval,
            cooldown: ERROR_COOLDOWN,
            last_track_id: None,
            moved: false,
        }
    }

    /// Replaces the wait after a failed tick, [`ERROR_COOLDOWN`] by default.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn cache(&self) -> &PlaylistCache {
        &self.cache
    }

    pub fn last_track_id(&self) -> Option<&str> {
        self.last_track_id.as_deref()
    }

    /// Caches the tracks of every source playlist.
    pub async fn prime(&mut self) {
        for pair in &self.pairs {
            self.cache
                .refresh(self.api.as_ref(), &pair.source_playlist_id)
                .await;
        }
    }

    /// Runs one poll.
    ///
    /// A track is processed when it differs from the last one seen, or when
    /// the last processing moved nothing. The second case keeps a track
    /// that started in another context eligible once playback switches to
    /// its source playlist.
    ///
    /// # Errors
    ///
    /// Only the playback query can fail a tick, with
    /// [`SpotifyError::RetriesExhausted`] once its retries are used up.
    /// Relocation errors are logged per pair and never escape.
    pub async fn tick(&mut self) -> Result<TickOutcome, SpotifyError> {
        let Some(track) = playback::current_track(self.api.as_ref()).await? else {
            return Ok(TickOutcome::Idle);
        };

        let changed = self.last_track_id.as_deref() != Some(track.id.as_str());
        if !changed && self.moved {
            return Ok(TickOutcome::Unchanged);
        }

        self.moved = false;
        for pair in &self.pairs {
            if relocation::maybe_relocate(self.api.as_ref(), &mut self.cache, &track, pair).await
            {
                self.moved = true;
            }
        }

        if !self.moved {
            info!(
                "No action taken for track '{}' (ID: {}).",
                track.name, track.id
            );
        }
        self.last_track_id = Some(track.id);

        Ok(TickOutcome::Processed { moved: self.moved })
    }

    /// Runs one tick and returns how long to wait before the next.
    ///
    /// An error escaping the tick is logged here and answered with the
    /// cooldown instead of the poll interval.
    pub async fn step(&mut self) -> Duration {
        match self.tick().await {
            Ok(_) => self.interval,
            Err(e) => {
                error!("Error in main process: {}", e);
                self.cooldown
            }
        }
    }

    /// Primes the cache and polls until the process is stopped.
    pub async fn run(mut self) {
        info!("Starting playlist shuffle helper...");
        self.prime().await;

        loop {
            let wait = self.step().await;
            sleep(wait).await;
        }
    }
}
