use reqwest::{Method, StatusCode};

use crate::{
    error::Result,
    types::{Album, ApiAlbum, Artist, FollowedArtistsResponse, Paging, ReleaseGroup},
};

use super::{Pagination, SpotifyClient, expect_status};

impl SpotifyClient {
    /// Retrieves every artist the current user follows.
    ///
    /// `/me/following` pages with a cursor: the `after` parameter of the next
    /// request is the id of the last artist received.
    ///
    /// # Errors
    ///
    /// Any failed page aborts the whole listing; a partial list is never
    /// returned.
    pub async fn get_followed_artists(&mut self) -> Result<Vec<Artist>> {
        self.fetch_all(
            "/me/following",
            &[("type", "artist".to_string()), ("locale", "en-US".to_string())],
            Pagination::Cursor(|artist: &Artist| artist.id.clone()),
            |res: FollowedArtistsResponse| res.artists,
        )
        .await
    }

    /// Follows `artist_id` as the current user.
    ///
    /// The API answers `204 No Content` on success; anything else comes back as
    /// [`crate::Error::Transport`] with the server message so the caller can
    /// choose between reporting and aborting.
    pub async fn follow_artist(&mut self, artist_id: &str) -> Result<()> {
        let response = self
            .send(
                Method::PUT,
                "/me/following",
                &[("type", "artist".to_string()), ("ids", artist_id.to_string())],
                None,
            )
            .await?;
        expect_status(response, &[StatusCode::NO_CONTENT]).await?;
        tracing::debug!(artist_id, "artist followed");
        Ok(())
    }

    /// Retrieves the full discography of `artist_id`.
    ///
    /// Albums, singles, compilations and appearances on other artists'
    /// releases are all included, in the order the API lists them.
    pub async fn get_artist_albums(&mut self, artist_id: &str) -> Result<Vec<Album>> {
        let include_groups = ReleaseGroup::ALL
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let albums = self
            .fetch_all(
                &format!("/artists/{}/albums", artist_id),
                &[
                    ("include_groups", include_groups),
                    ("market", "US".to_string()),
                    ("locale", "en-US".to_string()),
                ],
                Pagination::Offset,
                |page: Paging<ApiAlbum>| page,
            )
            .await?;

        Ok(albums
            .into_iter()
            .map(|album| album.into_album(artist_id))
            .collect())
    }
}
