use std::path::PathBuf;

use crate::{config, error::Result, types::Credential};

/// Keeps the Spotify credential on disk between runs.
pub struct TokenManager {
    path: PathBuf,
}

impl TokenManager {
    /// Token store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Token file in the local data directory.
    pub fn default_location() -> Self {
        Self::new(config::data_dir().join("cache/token.json"))
    }

    /// Reads the stored credential; `Ok(None)` when nothing was stored yet.
    pub async fn load(&self) -> Result<Option<Credential>> {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let credential: Credential = serde_json::from_str(&content)?;
        Ok(Some(credential))
    }

    /// Writes the credential as pretty JSON, creating parent directories.
    pub async fn persist(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_string_pretty(credential)?;
        async_fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Location of the token file.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
