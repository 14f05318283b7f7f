mod common;

use std::{sync::Arc, time::Duration};

use common::{Call, FakeSpotify, playing_from};
use spotshuffle::{
    error::SpotifyError,
    playback::{MAX_PLAYBACK_ATTEMPTS, current_track},
    poller::{ERROR_COOLDOWN, Poller},
    types::{Playback, PlaybackItem, PlaylistPair},
};
use tokio::time::Instant;

fn rate_limited(secs: Option<u64>) -> SpotifyError {
    SpotifyError::RateLimited {
        retry_after: secs.map(Duration::from_secs),
    }
}

#[tokio::test]
async fn test_returns_playing_track() {
    let api = FakeSpotify::new();
    api.set_playback(Some(playing_from("B", "src")));

    let track = current_track(&api).await.unwrap().unwrap();
    assert_eq!(track.id, "B");
    assert_eq!(track.name, "Track B");
}

#[tokio::test]
async fn test_nothing_playing() {
    let api = FakeSpotify::new();
    assert_eq!(current_track(&api).await.unwrap(), None);

    // player open, no item
    api.set_playback(Some(Playback::default()));
    assert_eq!(current_track(&api).await.unwrap(), None);

    // local file without id
    api.set_playback(Some(Playback {
        is_playing: true,
        item: Some(PlaybackItem {
            id: None,
            name: "local.mp3".to_string(),
        }),
        context: None,
    }));
    assert_eq!(current_track(&api).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_waits_for_retry_after() {
    let api = FakeSpotify::new();
    api.set_playback(Some(playing_from("B", "src")));
    api.update(|s| s.playback_errors.push_back(rate_limited(Some(5))));

    let track = current_track(&api).await.unwrap();
    assert_eq!(track.map(|t| t.id).as_deref(), Some("B"));

    let times = api.state.lock().unwrap().playback_times.clone();
    assert_eq!(times.len(), 2);
    assert!(times[1] - times[0] >= Duration::from_secs(5));
    assert_eq!(api.count(|c| *c == Call::Reauthorize), 0);
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_defaults_to_sixty_seconds() {
    let api = FakeSpotify::new();
    api.set_playback(Some(playing_from("B", "src")));
    api.update(|s| s.playback_errors.push_back(rate_limited(None)));

    let start = Instant::now();
    current_track(&api).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_then_expired_credential() {
    let api = FakeSpotify::new();
    api.set_playback(Some(playing_from("B", "src")));
    api.update(|s| {
        s.playback_errors.push_back(rate_limited(Some(5)));
        s.playback_errors.push_back(SpotifyError::Unauthorized);
    });

    let track = current_track(&api).await.unwrap();
    assert!(track.is_some());

    let times = api.state.lock().unwrap().playback_times.clone();
    assert!(times[1] - times[0] >= Duration::from_secs(5));
    assert_eq!(
        api.calls(),
        vec![
            Call::Playback,
            Call::Playback,
            Call::Reauthorize,
            Call::Playback
        ]
    );
}

#[tokio::test]
async fn test_expired_credential_reauthorizes_and_retries() {
    let api = FakeSpotify::new();
    api.set_playback(Some(playing_from("B", "src")));
    api.update(|s| s.credential_valid = false);

    let track = current_track(&api).await.unwrap();

    assert_eq!(track.map(|t| t.id).as_deref(), Some("B"));
    assert_eq!(
        api.calls(),
        vec![Call::Playback, Call::Reauthorize, Call::Playback]
    );
}

#[tokio::test(start_paused = true)]
async fn test_retries_are_bounded() {
    let api = FakeSpotify::new();
    api.set_playback(Some(playing_from("B", "src")));
    api.update(|s| {
        for _ in 0..10 {
            s.playback_errors.push_back(rate_limited(Some(1)));
        }
    });

    let result = current_track(&api).await;

    match result {
        Err(SpotifyError::RetriesExhausted { attempts, last }) => {
            assert_eq!(attempts, MAX_PLAYBACK_ATTEMPTS);
            assert!(matches!(*last, SpotifyError::RateLimited { .. }));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(
        api.count(|c| *c == Call::Playback),
        MAX_PLAYBACK_ATTEMPTS as usize
    );
}

#[tokio::test(start_paused = true)]
async fn test_repeated_unauthorized_backs_off() {
    let api = FakeSpotify::new();
    api.set_playback(Some(playing_from("B", "src")));
    api.update(|s| {
        for _ in 0..3 {
            s.playback_errors.push_back(SpotifyError::Unauthorized);
        }
    });

    let start = Instant::now();
    let track = current_track(&api).await.unwrap();

    assert!(track.is_some());
    assert_eq!(api.count(|c| *c == Call::Reauthorize), 3);
    // no wait before the first re-authorization, then 1s and 2s
    assert!(start.elapsed() >= Duration::from_secs(3));
}

#[tokio::test]
async fn test_other_errors_mean_nothing_playing() {
    let api = FakeSpotify::new();
    api.set_playback(Some(playing_from("B", "src")));
    api.update(|s| {
        s.playback_errors.push_back(SpotifyError::Api {
            status: 502,
            message: "Bad Gateway".to_string(),
        })
    });

    assert_eq!(current_track(&api).await.unwrap(), None);
    assert_eq!(api.calls(), vec![Call::Playback]);
}

#[tokio::test(start_paused = true)]
async fn test_poller_surfaces_exhausted_retries() {
    let api = Arc::new(FakeSpotify::new());
    api.set_playback(Some(playing_from("B", "src")));
    api.update(|s| {
        for _ in 0..MAX_PLAYBACK_ATTEMPTS {
            s.playback_errors.push_back(rate_limited(Some(1)));
        }
    });
    let pairs = vec![PlaylistPair {
        source_playlist_id: "src".to_string(),
        target_playlist_id: "dst".to_string(),
    }];
    let mut poller = Poller::new(api, pairs, Duration::from_secs(20));

    assert!(matches!(
        poller.tick().await,
        Err(SpotifyError::RetriesExhausted { .. })
    ));
    assert_eq!(poller.last_track_id(), None);
}

#[tokio::test(start_paused = true)]
async fn test_failed_step_waits_cooldown() {
    let api = Arc::new(FakeSpotify::new());
    api.set_playback(Some(playing_from("B", "src")));
    api.update(|s| {
        for _ in 0..MAX_PLAYBACK_ATTEMPTS {
            s.playback_errors.push_back(rate_limited(Some(1)));
        }
    });
    let pairs = vec![PlaylistPair {
        source_playlist_id: "src".to_string(),
        target_playlist_id: "dst".to_string(),
    }];
    let mut poller =
        Poller::new(api.clone(), pairs, Duration::from_secs(20)).with_cooldown(Duration::from_secs(90));

    assert_eq!(poller.step().await, Duration::from_secs(90));

    // the next tick gets through and waits the normal interval
    assert_eq!(poller.step().await, Duration::from_secs(20));
    assert_eq!(poller.last_track_id(), Some("B"));
}

#[tokio::test(start_paused = true)]
async fn test_default_cooldown_is_a_minute() {
    let api = Arc::new(FakeSpotify::new());
    api.update(|s| {
        for _ in 0..MAX_PLAYBACK_ATTEMPTS {
            s.playback_errors.push_back(rate_limited(Some(1)));
        }
    });
    let mut poller = Poller::new(api, Vec::new(), Duration::from_secs(20));

    assert_eq!(poller.step().await, ERROR_COOLDOWN);
    assert_eq!(ERROR_COOLDOWN, Duration::from_secs(60));
}
