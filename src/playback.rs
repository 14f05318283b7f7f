//! Playback observer.
//!
//! Asks Spotify what is playing right now. Expired credentials and rate
//! limits are handled here with a bounded retry loop; every other failure is
//! reported as "nothing playing" so a flaky playback check never stops the
//! poller.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{error::SpotifyError, spotify::SpotifyApi, types::NowPlaying};

/// Attempts per playback query before giving up with
/// [`SpotifyError::RetriesExhausted`].
pub const MAX_PLAYBACK_ATTEMPTS: u32 = 5;

/// Wait applied to a 429 without a usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Returns the track currently playing.
///
/// - `Ok(None)` when nothing plays, the item has no id, or the query failed
///   with an error that retrying cannot fix (logged).
/// - 401: re-authorizes through the API (waiting while the interactive
///   authorization is pending) and asks again. Retries after the first back
///   off 1s, 2s, 4s, ...
/// - 429: sleeps for the advised `Retry-After` (60s if absent) and asks again.
/// - `Err(RetriesExhausted)` after [`MAX_PLAYBACK_ATTEMPTS`] attempts.
///
/// # Errors
///
/// Only [`SpotifyError::RetriesExhausted`], wrapping the last error seen.
/// The poll loop answers it with its cooldown.
///
/// # Example
///
/// ```
/// if let Some(track) = playback::current_track(client.as_ref()).await? {
///     info!("Now playing '{}' ({})", track.name, track.id);
/// }
/// ```
pub async fn current_track<A>(api: &A) -> Result<Option<NowPlaying>, SpotifyError>
where
    A: SpotifyApi + ?Sized,
{
    let mut auth_retries = 0;
    let mut last_error = None;

    for _ in 0..MAX_PLAYBACK_ATTEMPTS {
        match api.current_playback().await {
            Ok(playback) => return Ok(playback.and_then(|p| p.now_playing())),
            Err(SpotifyError::Unauthorized) | Err(SpotifyError::AuthorizationPending) => {
                info!("Access token expired. Refreshing token...");
                if auth_retries > 0 {
                    sleep(auth_backoff(auth_retries)).await;
                }
                auth_retries += 1;

                if let Err(e) = api.reauthorize().await {
                    error!("Error refreshing access token: {}", e);
                    last_error = Some(e);
                    continue;
                }
                info!("Token refreshed successfully.");
                last_error = Some(SpotifyError::Unauthorized);
            }
            Err(SpotifyError::RateLimited { retry_after }) => {
                let wait = retry_after.unwrap_or(DEFAULT_RETRY_AFTER);
                warn!(
                    "API rate limit reached. Waiting for {} seconds cooldown...",
                    wait.as_secs()
                );
                sleep(wait).await;
                last_error = Some(SpotifyError::RateLimited { retry_after });
            }
            Err(e) => {
                error!("Error retrieving current track: {}", e);
                return Ok(None);
            }
        }
    }

    Err(SpotifyError::RetriesExhausted {
        attempts: MAX_PLAYBACK_ATTEMPTS,
        last: Box::new(last_error.unwrap_or(SpotifyError::Unauthorized)),
    })
}

/// Delay before the n-th (1-based) repeated re-authorization.
fn auth_backoff(retry: u32) -> Duration {
    Duration::from_secs(1 << (retry - 1).min(5))
}
