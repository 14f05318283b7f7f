//! Relocation engine: moves the playing track from a source playlist to its
//! target playlist.

use tracing::{error, info};

use crate::{
    management::PlaylistCache,
    spotify::SpotifyApi,
    types::{NowPlaying, PlaylistPair},
};

/// Moves `track` from the pair's source playlist to its target playlist if
/// it is playing from the source right now.
///
/// # Arguments
///
/// * `api` - Spotify access, also used to confirm the playback context
/// * `cache` - cached source playlist contents, refreshed on a miss
/// * `track` - the track the playback observer reported
/// * `pair` - the source and target playlist ids
///
/// # Returns
///
/// `true` once the track has been added to the target, `false` when it was
/// left alone or the add failed.
///
/// 1. Playback is fetched again: the source playlist must be the active
///    context and playback must not be paused.
/// 2. The track must be in the cached source list; on a miss the source is
///    refreshed once and checked again.
/// 3. The track is added to the target first and only then removed from the
///    source, so it is never missing from both. The cached source list
///    drops the id afterwards.
///
/// Errors are logged, nothing is returned to the caller. A move that fails
/// halfway is not rolled back: when the remove fails the track stays in the
/// source playlist and in its cache entry, but still counts as moved so the
/// poll loop does not add it to the target again while it keeps playing.
pub async fn maybe_relocate<A>(
    api: &A,
    cache: &mut PlaylistCache,
    track: &NowPlaying,
    pair: &PlaylistPair,
) -> bool
where
    A: SpotifyApi + ?Sized,
{
    let source = pair.source_playlist_id.as_str();
    let target = pair.target_playlist_id.as_str();

    let playback = match api.current_playback().await {
        Ok(Some(playback)) => playback,
        Ok(None) => return false,
        Err(e) => {
            error!("Error moving track '{}': {}", track.name, e);
            return false;
        }
    };
    if !playback.is_playing_from(source) {
        return false;
    }

    let source_name = cache.label(api, source).await;
    let target_name = cache.label(api, target).await;

    if !cache.contains(source, &track.id) {
        info!(
            "'{}' not found in cache of playlist '{}'. Updating cache.",
            track.name, source_name
        );
        cache.refresh(api, source).await;
    }

    if !cache.contains(source, &track.id) {
        info!(
            "'{}' is not in the source playlist '{}' after updating the cache.",
            track.name, source_name
        );
        return false;
    }

    info!(
        "Moving '{}' from playlist '{}' to playlist '{}'.",
        track.name, source_name, target_name
    );

    let ids = [track.id.clone()];
    if let Err(e) = api.add_tracks(target, &ids).await {
        error!(
            "Error adding '{}' to playlist '{}': {}",
            track.name, target_name, e
        );
        return false;
    }

    if let Err(e) = api.remove_tracks(source, &ids).await {
        error!(
            "Error removing '{}' from playlist '{}', it is now in both '{}' and '{}': {}",
            track.name, source_name, source_name, target_name, e
        );
        return true;
    }

    cache.remove(source, &track.id);
    true
}
