use reqwest::Client;
use tabled::Table;

use crate::{
    cli::load_settings,
    error, info,
    management::PlaylistCache,
    spotify::{AuthStatus, Authorizer, SpotifyClient},
    types::PairTableRow,
};

/// Prints the configured playlist pairs with their names and the number of
/// tracks left in each source playlist.
pub async fn pairs() {
    let settings = load_settings();
    let http = Client::new();
    let authorizer = Authorizer::new(settings.auth.clone(), http.clone());

    if authorizer.authenticate().await == AuthStatus::Pending {
        error!("No usable cached token. Run spotshuffle auth first.");
    }

    let client = SpotifyClient::new(http, settings.api_url, authorizer);
    let mut cache = PlaylistCache::new();

    info!("Resolving {} playlist pair(s)...", settings.pairs.len());

    let mut rows = Vec::with_capacity(settings.pairs.len());
    for pair in &settings.pairs {
        let source = &pair.source_playlist_id;
        let target = &pair.target_playlist_id;

        cache.refresh(&client, source).await;
        let tracks = cache
            .len(source)
            .map(|n| n.to_string())
            .unwrap_or_else(|| "?".to_string());

        rows.push(PairTableRow {
            source: format!("{} ({})", cache.label(&client, source).await, source),
            target: format!("{} ({})", cache.label(&client, target).await, target),
            tracks,
        });
    }

    let table = Table::new(rows);
    println!("{}", table);
}
