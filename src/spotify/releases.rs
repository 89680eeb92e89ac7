use crate::{
    error::{Error, Result},
    types::{AlbumRef, ApiTrack, GetSeveralAlbumsResponse, Paging, Track},
    warning,
};

use super::{MAX_ALBUM_BATCH, Pagination, SpotifyClient};

impl SpotifyClient {
    /// Retrieves every track on an album.
    ///
    /// The tracks endpoint carries no album object, so the album reference on
    /// each row is derived from `album_id` and has no album name.
    pub async fn get_album_tracks(&mut self, album_id: &str) -> Result<Vec<Track>> {
        let album = AlbumRef {
            id: album_id.to_string(),
            uri: format!("spotify:album:{}", album_id),
            name: String::new(),
        };
        self.album_tracks(&album).await
    }

    /// Pages through the tracks endpoint of `album`, tagging every row with it.
    async fn album_tracks(&mut self, album: &AlbumRef) -> Result<Vec<Track>> {
        let tracks = self
            .fetch_all(
                &format!("/albums/{}/tracks", album.id),
                &[("market", "US".to_string())],
                Pagination::Offset,
                |page: Paging<ApiTrack>| page,
            )
            .await?;

        Ok(tracks
            .into_iter()
            .filter_map(|t| t.into_track(Some(album)))
            .collect())
    }

    /// Retrieves the tracks of up to [`MAX_ALBUM_BATCH`] albums at once.
    ///
    /// The several-albums endpoint embeds only the first page of each album's
    /// tracks. Albums whose track count reaches that page's limit are fetched
    /// again through the album-tracks endpoint so long releases come back
    /// complete; all other albums use the embedded tracks. Both paths carry
    /// the album's name and URI on every row.
    ///
    /// Unknown ids come back as `null` and are skipped with a warning.
    ///
    /// # Returns
    ///
    /// The tracks of all requested albums, album by album in response order.
    pub async fn get_several_albums_tracks(&mut self, album_ids: &[String]) -> Result<Vec<Track>> {
        if album_ids.is_empty() {
            return Ok(Vec::new());
        }
        if album_ids.len() > MAX_ALBUM_BATCH {
            return Err(Error::BatchLimit {
                limit: MAX_ALBUM_BATCH,
                got: album_ids.len(),
            });
        }

        let response: GetSeveralAlbumsResponse = self
            .get_json(
                "/albums",
                &[("ids", album_ids.join(",")), ("market", "US".to_string())],
            )
            .await?;

        let mut tracks = Vec::new();
        for (requested, album) in album_ids.iter().zip(response.albums) {
            let Some(album) = album else {
                warning!("Album {} not found, skipping.", requested);
                continue;
            };

            let page_limit = album
                .tracks
                .limit
                .unwrap_or(super::PAGE_SIZE as u64);
            let album_ref = album.album_ref();
            if album.total_tracks >= page_limit {
                tracing::debug!(album_id = %album.id, total = album.total_tracks, "album exceeds embedded page");
                tracks.extend(self.album_tracks(&album_ref).await?);
            } else {
                tracks.extend(
                    album
                        .tracks
                        .items
                        .into_iter()
                        .filter_map(|t| t.into_track(Some(&album_ref))),
                );
            }
        }

        Ok(tracks)
    }
}
