use std::path::{Path, PathBuf};

use crate::{error::SpotifyError, types::Token};

/// The token cache file.
///
/// Holds the last token obtained from Spotify so the process can restart
/// without another interactive authorization.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenStore { path: path.into() }
    }

    pub async fn load(&self) -> Result<Token, SpotifyError> {
        let content = async_fs::read_to_string(&self.path).await?;
        let token: Token = serde_json::from_str(&content)?;
        Ok(token)
    }

    pub async fn persist(&self, token: &Token) -> Result<(), SpotifyError> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(token)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
