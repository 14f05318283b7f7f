use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use reqwest::{Client, Url, header::AUTHORIZATION};
use tokio::sync::{Mutex, watch};
use tracing::{error, info, warn};

use crate::{
    config::AuthConfig,
    error::SpotifyError,
    management::TokenStore,
    server,
    types::{PendingAuthorization, Token, TokenResponse},
    utils,
};

/// Outcome of [`Authorizer::authenticate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// A credential has been published.
    Ready,
    /// The callback server is up and waits for the user to authorize.
    Pending,
}

/// Owns the Spotify credential for the whole process.
///
/// The current token is published through a `watch` channel. The poll loop
/// reads from it and waits on it while authorization is pending; the
/// callback handler and the refresh path are the only writers.
pub struct Authorizer {
    config: AuthConfig,
    http: Client,
    store: TokenStore,
    credential: watch::Sender<Option<Token>>,
    pending: Mutex<Option<PendingAuthorization>>,
    server_started: AtomicBool,
}

impl Authorizer {
    pub fn new(config: AuthConfig, http: Client) -> Arc<Self> {
        let store = TokenStore::new(config.token_cache.clone());
        let (credential, _) = watch::channel(None);
        Arc::new(Authorizer {
            config,
            http,
            store,
            credential,
            pending: Mutex::new(None),
            server_started: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn is_ready(&self) -> bool {
        self.credential.borrow().is_some()
    }

    pub fn current_token(&self) -> Option<Token> {
        self.credential.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Token>> {
        self.credential.subscribe()
    }

    /// Makes `token` the credential used by every following API call.
    pub fn publish(&self, token: Token) {
        self.credential.send_replace(Some(token));
    }

    /// Refreshes the cached token, falling back to the interactive flow.
    ///
    /// 1. Load the token cache and exchange its refresh token for a new
    ///    access token. On success the token is persisted and published.
    /// 2. If the token endpoint cannot be reached or fails with a 5xx, the
    ///    cached token is published as it is and `Ready` is returned. An
    ///    expired one will be rejected with a 401 and the next
    ///    `authenticate` tries the refresh again.
    /// 3. A missing or unreadable cache, or a refresh token Spotify rejects,
    ///    means there is nothing to fall back to: the published credential
    ///    is cleared, the callback server is started (once at a time) and
    ///    `Pending` is returned.
    ///
    /// # Returns
    ///
    /// - `AuthStatus::Ready` - a credential is published
    /// - `AuthStatus::Pending` - the user has to authorize in the browser,
    ///   see [`Authorizer::wait_ready`]
    pub async fn authenticate(self: &Arc<Self>) -> AuthStatus {
        match self.store.load().await {
            Ok(cached) => match self.refresh(&cached).await {
                Ok(token) => {
                    if let Err(e) = self.store.persist(&token).await {
                        error!("Failed to save token to cache: {}", e);
                    }
                    self.publish(token);
                    info!("Spotify authenticated with cached token.");
                    return AuthStatus::Ready;
                }
                Err(e) if e.is_grant_rejected() => {
                    error!("Cached token was rejected by Spotify: {}", e);
                }
                Err(e) => {
                    warn!("Error refreshing cached token, using it as is: {}", e);
                    self.publish(cached);
                    return AuthStatus::Ready;
                }
            },
            Err(SpotifyError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!("Error reading cached token: {}", e),
        }

        info!("Spotify token not found in cache, using web authentication.");
        self.credential.send_replace(None);
        self.start_server();
        info!(
            "Waiting for Spotify authorization, open http://{}/ in a browser.",
            self.config.server_addr
        );
        AuthStatus::Pending
    }

    /// Resolves once a credential is published.
    pub async fn wait_ready(&self) -> Result<Token, SpotifyError> {
        let mut rx = self.credential.subscribe();
        let token = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| SpotifyError::AuthorizationPending)?;
        token.clone().ok_or(SpotifyError::AuthorizationPending)
    }

    /// Access token for the next request.
    ///
    /// A token close to expiry is refreshed first. A failed refresh is only
    /// logged; the old token is used and the 401 handling takes over.
    pub async fn access_token(&self) -> Result<String, SpotifyError> {
        let token = self
            .current_token()
            .ok_or(SpotifyError::AuthorizationPending)?;

        if !token.is_expired() {
            return Ok(token.access_token);
        }

        match self.refresh(&token).await {
            Ok(fresh) => {
                if let Err(e) = self.store.persist(&fresh).await {
                    error!("Failed to save token to cache: {}", e);
                }
                let access_token = fresh.access_token.clone();
                self.publish(fresh);
                Ok(access_token)
            }
            Err(e) => {
                warn!("Proactive token refresh failed: {}", e);
                Ok(token.access_token)
            }
        }
    }

    /// Creates a new authorization request and returns the URL the user has
    /// to visit. Replaces any request still in flight.
    pub async fn authorize_url(&self) -> Result<String, SpotifyError> {
        let state = utils::generate_state();
        let verifier = match self.config.client_secret {
            Some(_) => None,
            None => Some(utils::generate_code_verifier()),
        };

        let mut params = vec![
            ("client_id", self.config.client_id.clone()),
            ("response_type", "code".to_string()),
            ("redirect_uri", self.config.redirect_uri.clone()),
            ("scope", self.config.scope.clone()),
            ("state", state.clone()),
        ];
        if let Some(verifier) = &verifier {
            params.push(("code_challenge", utils::generate_code_challenge(verifier)));
            params.push(("code_challenge_method", "S256".to_string()));
        }

        let url = Url::parse_with_params(&self.config.auth_url, &params)
            .map_err(|e| SpotifyError::Token(format!("invalid authorization URL: {}", e)))?;

        *self.pending.lock().await = Some(PendingAuthorization {
            state,
            code_verifier: verifier,
        });

        Ok(url.to_string())
    }

    /// Finishes the authorization started by [`Authorizer::authorize_url`].
    ///
    /// The `state` must match the pending request. The obtained token is
    /// persisted and published.
    pub async fn complete(&self, code: &str, state: Option<&str>) -> Result<Token, SpotifyError> {
        let pending = {
            let mut lock = self.pending.lock().await;
            let state_matches = match lock.as_ref() {
                None => {
                    return Err(SpotifyError::Token(
                        "no authorization in progress".to_string(),
                    ));
                }
                Some(p) => state == Some(p.state.as_str()),
            };
            if !state_matches {
                return Err(SpotifyError::Token("state mismatch".to_string()));
            }
            lock.take()
        };
        let verifier = pending.and_then(|p| p.code_verifier);

        let token = exchange_code(&self.http, &self.config, code, verifier.as_deref()).await?;
        if let Err(e) = self.store.persist(&token).await {
            error!("Failed to save token to cache: {}", e);
        }
        self.publish(token.clone());
        info!("Spotify authentication successful.");
        Ok(token)
    }

    /// Starts the callback server in the background unless it already runs.
    ///
    /// The server stops on its own once a credential is published, so the
    /// authorization endpoints are only reachable while an authorization is
    /// pending. A later `Pending` starts it again.
    pub fn start_server(self: &Arc<Self>) {
        if self.server_started.swap(true, Ordering::SeqCst) {
            return;
        }

        let authorizer = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                if let Err(e) = server::start_api_server(Arc::clone(&authorizer)).await {
                    error!("Authorization server stopped: {}", e);
                    break;
                }
                // cleared again while shutting down
                if authorizer.is_ready() {
                    break;
                }
            }
            authorizer.server_started.store(false, Ordering::SeqCst);
        });
    }

    /// Whether the callback server task is running.
    pub fn server_running(&self) -> bool {
        self.server_started.load(Ordering::SeqCst)
    }

    async fn refresh(&self, token: &Token) -> Result<Token, SpotifyError> {
        let refresh = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| SpotifyError::Token("cached token has no refresh token".to_string()))?;
        refresh_token(&self.http, &self.config, refresh).await
    }
}

/// Exchanges an authorization code for a token.
///
/// `verifier` is the PKCE code verifier when the authorization URL carried a
/// code challenge.
pub async fn exchange_code(
    http: &Client,
    config: &AuthConfig,
    code: &str,
    verifier: Option<&str>,
) -> Result<Token, SpotifyError> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", config.redirect_uri.as_str()),
    ];
    if let Some(verifier) = verifier {
        form.push(("code_verifier", verifier));
    }

    let response = token_request(http, config, form).await?;
    Ok(Token::from_response(response, None))
}

/// Exchanges a refresh token for a new access token.
///
/// Spotify may rotate the refresh token; when the response carries none the
/// old one stays valid and is kept.
pub async fn refresh_token(
    http: &Client,
    config: &AuthConfig,
    refresh_token: &str,
) -> Result<Token, SpotifyError> {
    let form = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
    ];

    let response = token_request(http, config, form).await?;
    Ok(Token::from_response(
        response,
        Some(refresh_token.to_string()),
    ))
}

async fn token_request(
    http: &Client,
    config: &AuthConfig,
    mut form: Vec<(&str, &str)>,
) -> Result<TokenResponse, SpotifyError> {
    let mut request = http.post(&config.token_url);
    match &config.client_secret {
        Some(secret) => {
            request = request.header(
                AUTHORIZATION,
                utils::basic_auth_header(&config.client_id, secret),
            );
        }
        None => form.push(("client_id", config.client_id.as_str())),
    }

    let response = request.form(&form).send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(SpotifyError::from_status(status.as_u16(), &body, None));
    }

    Ok(serde_json::from_str(&body)?)
}
