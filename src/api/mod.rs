//! # API Module
//!
//! HTTP endpoints of the local authorization server. The server only runs
//! while no usable cached token exists.
//!
//! ## Endpoints
//!
//! - [`index`] - `GET /` redirects to Spotify's authorization page with a
//!   fresh `state` (and a PKCE challenge when no client secret is set).
//! - [`callback`] - `GET /callback?code=..&state=..` exchanges the code for a
//!   token, persists it and hands it to the poll loop.
//! - [`health`] - `GET /health` reports version and whether a credential is
//!   available.
//!
//! All handlers receive the shared [`crate::spotify::Authorizer`] through an
//! axum `Extension`.

mod callback;
mod health;
mod index;

pub use callback::callback;
pub use health::health;
pub use index::index;
