use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest, Paging,
        Playlist, PlaylistItem, Track,
    },
    warning,
};

use super::{MAX_PLAYLIST_BATCH, Pagination, SpotifyClient, decode, expect_status};

#[derive(Debug, Deserialize)]
struct ApiPlaylist {
    id: String,
    name: String,
}

impl SpotifyClient {
    /// Retrieves every playlist owned or followed by the current user.
    pub async fn get_current_user_playlists(&mut self) -> Result<Vec<Playlist>> {
        let playlists = self
            .fetch_all(
                "/me/playlists",
                &[],
                Pagination::Offset,
                |page: Paging<Option<ApiPlaylist>>| page,
            )
            .await?;

        Ok(playlists
            .into_iter()
            .flatten()
            .map(|p| Playlist {
                id: p.id,
                name: p.name,
            })
            .collect())
    }

    /// Creates a private, non-collaborative playlist for the current user.
    ///
    /// Spotify happily creates several playlists with the same name, so the
    /// current playlists are loaded first. When one is already called `name`
    /// a warning is printed and `Ok(None)` returned without creating anything.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(playlist))` - the playlist was created (`201 Created`)
    /// - `Ok(None)` - a playlist with this name already exists
    /// - `Err(Error::Transport)` - the API refused the creation
    pub async fn create_playlist(
        &mut self,
        name: &str,
        description: &str,
    ) -> Result<Option<Playlist>> {
        let existing = self.get_current_user_playlists().await?;
        if existing.iter().any(|p| p.name == name) {
            warning!("Playlist {} already exists.", name);
            return Ok(None);
        }

        let user_id = self.user_id().await?;
        let body = serde_json::to_value(CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public: false,
            collaborative: false,
        })?;

        let path = format!("/users/{}/playlists", user_id);
        let response = self.send(Method::POST, &path, &[], Some(&body)).await?;
        let body = expect_status(response, &[StatusCode::CREATED]).await?;
        let created: ApiPlaylist = decode(&path, &body)?;

        Ok(Some(Playlist {
            id: created.id,
            name: created.name,
        }))
    }

    /// Retrieves every track of a playlist, including when it was added.
    ///
    /// Entries without a usable track (removed tracks, local files, podcast
    /// episodes) count towards paging but produce no row.
    pub async fn get_playlist_items(&mut self, playlist_id: &str) -> Result<Vec<Track>> {
        let items = self
            .fetch_all(
                &format!("/playlists/{}/tracks", playlist_id),
                &[("market", "US".to_string())],
                Pagination::Offset,
                |page: Paging<PlaylistItem>| page,
            )
            .await?;

        Ok(items
            .into_iter()
            .filter_map(|item| {
                let added_at = item.added_at;
                item.track.and_then(|t| t.into_track(None)).map(|mut track| {
                    track.added_at = added_at;
                    track
                })
            })
            .collect())
    }

    /// Appends `track_uris` to a playlist in a single request.
    ///
    /// The API takes at most [`MAX_PLAYLIST_BATCH`] URIs per call; splitting
    /// larger lists is up to the caller. An empty list sends nothing.
    ///
    /// # Returns
    ///
    /// The playlist's new snapshot id (`None` when nothing was sent).
    pub async fn add_items_to_playlist(
        &mut self,
        playlist_id: &str,
        track_uris: &[String],
    ) -> Result<Option<String>> {
        if track_uris.is_empty() {
            return Ok(None);
        }
        if track_uris.len() > MAX_PLAYLIST_BATCH {
            return Err(Error::BatchLimit {
                limit: MAX_PLAYLIST_BATCH,
                got: track_uris.len(),
            });
        }

        let body = serde_json::to_value(AddTrackToPlaylistRequest {
            uris: track_uris.to_vec(),
        })?;
        let path = format!("/playlists/{}/tracks", playlist_id);
        let response = self.send(Method::POST, &path, &[], Some(&body)).await?;
        let body = expect_status(response, &[StatusCode::CREATED]).await?;
        let snapshot: AddTrackToPlaylistResponse = decode(&path, &body)?;

        Ok(Some(snapshot.snapshot_id))
    }
}
