use std::sync::Arc;

use reqwest::Client;

use crate::{
    config::{self, Settings},
    error, logging,
    poller::Poller,
    spotify::{AuthStatus, Authorizer, SpotifyClient},
};

/// Authorizes, primes the playlist cache and polls until the process is
/// stopped. Only configuration and logging setup errors end the process.
pub async fn run() {
    let log_file = config::log_file();
    if let Err(e) = logging::init(&log_file) {
        error!("Cannot set up logging at {}: {}", log_file.display(), e);
    }
    logging::banner();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Watching {} playlist pair(s), checking every {} seconds.",
        settings.pairs.len(),
        settings.sleep_time.as_secs()
    );

    let http = Client::new();
    let authorizer = Authorizer::new(settings.auth.clone(), http.clone());
    if authorizer.authenticate().await == AuthStatus::Pending {
        tracing::info!("Waiting for Spotify authentication...");
        if let Err(e) = authorizer.wait_ready().await {
            tracing::error!("Authorization did not complete: {}", e);
            std::process::exit(1);
        }
    }

    let client = Arc::new(SpotifyClient::new(http, settings.api_url, authorizer));
    Poller::new(client, settings.pairs, settings.sleep_time)
        .run()
        .await;
}
