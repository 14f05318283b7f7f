mod auth;
mod cache;

pub use auth::TokenStore;
pub use cache::PlaylistCache;
