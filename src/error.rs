//! Error types shared by the Spotify client, the ledger and the review workflow.

use thiserror::Error;

/// Everything that can go wrong while talking to Spotify or touching local state.
#[derive(Debug, Error)]
pub enum Error {
    /// Credential exchange failed or no usable credential is available.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A response was missing expected fields or paging did not add up.
    #[error("unexpected response data: {0}")]
    Data(String),

    /// Required configuration or remote setup is missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// The API answered with a non-success status.
    #[error("request failed with status {status}: {message}")]
    Transport { status: u16, message: String },

    /// A caller tried to send more items in one request than the API accepts.
    #[error("batch of {got} items exceeds the limit of {limit}")]
    BatchLimit { limit: usize, got: usize },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// HTTP status attached to a transport failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result alias used by the library layers.
pub type Result<T> = std::result::Result<T, Error>;
