use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;

use crate::{cli::load_settings, error, spotify::Authorizer, success, warning};

/// How long the interactive authorization may take.
const AUTH_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs the interactive authorization in the foreground and caches the
/// token, so `run` can start without a browser later.
pub async fn auth() {
    let settings = load_settings();
    let authorizer = Authorizer::new(settings.auth, Client::new());
    authorizer.start_server();

    let auth_url = match authorizer.authorize_url().await {
        Ok(url) => url,
        Err(e) => error!("Failed to build authorization URL: {}", e),
    };

    if webbrowser::open(&auth_url).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let pb = ProgressBar::new_spinner();
    pb.set_message("Waiting for Spotify authorization...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );

    let result = tokio::time::timeout(AUTH_TIMEOUT, authorizer.wait_ready()).await;
    pb.finish_and_clear();

    match result {
        Ok(Ok(_)) => success!(
            "Authentication successful! Token cached at {}",
            authorizer.store().path().display()
        ),
        _ => error!("Authentication failed or timed out."),
    }
}
