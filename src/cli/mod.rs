//! # CLI Module
//!
//! User-facing commands of spotreview. Each command builds a
//! [`SpotifyClient`] from the environment and the stored credential, runs one
//! or more client operations, renders the result and writes a refreshed
//! credential back to disk.
//!
//! ## Commands
//!
//! - [`auth`] - authorization-code flow, stores the refresh token
//! - [`me`] - prints the current user's id
//! - [`list_artists`], [`follow`], [`list_albums`] - artist operations
//! - [`list_playlists`], [`create_playlist`], [`playlist_items`] - playlists
//! - [`album_tracks`] - tracks of one or more albums
//! - [`review`] - the discography review workflow, see
//!   [`review_artist_discography`]
//!
//! ```bash
//! spotreview auth --callback
//! spotreview review 0OdUWJ0sBjDrqHygGUXeCF
//! ```

mod artists;
mod auth;
mod info;
mod playlist;
mod releases;
mod review;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use artists::follow;
pub use artists::list_albums;
pub use artists::list_artists;
pub use auth::auth;
pub use info::me;
pub use playlist::create_playlist;
pub use playlist::list_playlists;
pub use playlist::playlist_items;
pub use releases::album_tracks;
pub use review::{
    CONFIRMATION, FailurePolicy, PENDING_REVIEW_PLAYLIST, Prompt, ReviewOutcome, ReviewSummary,
    StdinPrompt, review, review_artist_discography,
};

use crate::{
    Res,
    config::SpotifyConfig,
    error::Error,
    management::TokenManager,
    spotify::{SpotifyClient, auth::Authenticator},
};

/// Builds a client from the environment and the stored credential.
///
/// A refresh token in `SPOTIFY_REFRESH_TOKEN` wins over the stored one.
pub(crate) async fn connect() -> Res<SpotifyClient> {
    let config = SpotifyConfig::from_env()?;
    let client = SpotifyClient::new(config.clone())?;

    if config.refresh_token.is_some() {
        return Ok(client);
    }

    match TokenManager::default_location().load().await? {
        Some(credential) => {
            let auth = Authenticator::new(client.http().clone(), config).with_credential(credential);
            Ok(client.with_authenticator(auth))
        }
        None => Err(Error::Auth("no stored credential. Please run spotreview auth".to_string()).into()),
    }
}

/// Writes the credential back if it was refreshed during the command.
pub(crate) async fn save_credential(client: &mut SpotifyClient) -> Res<()> {
    if !client.auth_mut().take_changed() {
        return Ok(());
    }
    if let Some(credential) = client.auth().credential() {
        TokenManager::default_location().persist(credential).await?;
    }
    Ok(())
}

pub(crate) fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
