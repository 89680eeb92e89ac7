use std::{collections::BTreeSet, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// The four release groups an artist's album listing can be filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseGroup {
    Album,
    Single,
    AppearsOn,
    Compilation,
}

impl ReleaseGroup {
    pub const ALL: [ReleaseGroup; 4] = [
        ReleaseGroup::Album,
        ReleaseGroup::Single,
        ReleaseGroup::AppearsOn,
        ReleaseGroup::Compilation,
    ];

    /// Name used by the API in `include_groups` and `album_group`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseGroup::Album => "album",
            ReleaseGroup::Single => "single",
            ReleaseGroup::AppearsOn => "appears_on",
            ReleaseGroup::Compilation => "compilation",
        }
    }
}

impl fmt::Display for ReleaseGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "album" => Ok(ReleaseGroup::Album),
            "single" => Ok(ReleaseGroup::Single),
            "appears_on" => Ok(ReleaseGroup::AppearsOn),
            "compilation" => Ok(ReleaseGroup::Compilation),
            other => Err(format!("unknown release group: {}", other)),
        }
    }
}

/// Bearer credential pair plus the moment the access token stops being valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub refresh_token: String,
    #[serde(default)]
    pub access_token: String,
    /// Unix timestamp in seconds.
    #[serde(default)]
    pub expires_at: i64,
}

impl Credential {
    /// A credential that only knows its refresh token; first use refreshes it.
    pub fn from_refresh_token(refresh_token: impl Into<String>) -> Self {
        Self {
            refresh_token: refresh_token.into(),
            access_token: String::new(),
            expires_at: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub name: String,
    pub release_group: ReleaseGroup,
    pub release_date: String,
    pub is_playable: bool,
    pub artist_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub artist_ids: Vec<String>,
    pub artist_names: Vec<String>,
    pub album_id: String,
    pub album_uri: String,
    pub album_name: Option<String>,
    pub disc_number: u32,
    pub track_number: u32,
    pub is_playable: bool,
    pub duration_seconds: u64,
    pub added_at: Option<DateTime<Utc>>,
}

impl Track {
    /// Key under which two releases count as the same recording.
    pub fn recording_key(&self) -> (String, BTreeSet<String>, u64) {
        (
            self.name.clone(),
            self.artist_ids.iter().cloned().collect(),
            self.duration_seconds,
        )
    }

    /// Whether `artist_id` is credited on the track, featured or not.
    pub fn has_artist(&self, artist_id: &str) -> bool {
        self.artist_ids.iter().any(|id| id == artist_id)
    }
}

/// Converts a millisecond duration to whole seconds, rounding halves to even.
pub fn duration_seconds(duration_ms: u64) -> u64 {
    (duration_ms as f64 / 1000.0).round_ties_even() as u64
}

// Wire types. Only the fields spotreview reads are declared.

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Paging<T> {
    pub items: Vec<T>,
    pub total: u64,
    #[serde(default)]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FollowedArtistsResponse {
    pub artists: Paging<Artist>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumRef {
    pub id: String,
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiAlbum {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub album_group: Option<ReleaseGroup>,
    pub album_type: String,
    pub release_date: String,
    #[serde(default)]
    pub is_playable: Option<bool>,
}

impl ApiAlbum {
    /// Flattens the album into a row owned by `artist_id`. A missing
    /// `album_group` falls back to `album_type`.
    pub fn into_album(self, artist_id: &str) -> Album {
        let release_group = self
            .album_group
            .or_else(|| self.album_type.parse().ok())
            .unwrap_or(ReleaseGroup::Album);
        Album {
            id: self.id,
            name: self.name,
            release_group,
            release_date: self.release_date,
            is_playable: self.is_playable.unwrap_or(true),
            artist_id: artist_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiTrack {
    #[serde(default)]
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub album: Option<AlbumRef>,
    #[serde(default)]
    pub disc_number: u32,
    #[serde(default)]
    pub track_number: u32,
    #[serde(default)]
    pub is_playable: Option<bool>,
    pub duration_ms: u64,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ApiTrack {
    /// Flattens the track into a row. Tracks without an id (local files) and
    /// episodes have no row.
    pub fn into_track(self, album: Option<&AlbumRef>) -> Option<Track> {
        if self.kind.as_deref().is_some_and(|k| k != "track") {
            return None;
        }
        let id = self.id?;
        let album = album.cloned().or(self.album)?;
        Some(Track {
            id,
            uri: self.uri,
            name: self.name,
            artist_ids: self.artists.iter().map(|a| a.id.clone()).collect(),
            artist_names: self.artists.into_iter().map(|a| a.name).collect(),
            album_id: album.id,
            album_uri: album.uri,
            album_name: Some(album.name).filter(|n| !n.is_empty()),
            disc_number: self.disc_number,
            track_number: self.track_number,
            is_playable: self.is_playable.unwrap_or(true),
            duration_seconds: duration_seconds(self.duration_ms),
            added_at: None,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub added_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub track: Option<ApiTrack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FullAlbum {
    pub id: String,
    pub name: String,
    pub uri: String,
    pub total_tracks: u64,
    pub tracks: Paging<ApiTrack>,
}

impl FullAlbum {
    /// Reference used to tag the album's tracks.
    pub fn album_ref(&self) -> AlbumRef {
        AlbumRef {
            id: self.id.clone(),
            uri: self.uri.clone(),
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetSeveralAlbumsResponse {
    pub albums: Vec<Option<FullAlbum>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
    pub public: bool,
    pub collaborative: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTrackToPlaylistResponse {
    pub snapshot_id: String,
}

// Table rows for the CLI. Lists are flattened into delimited strings.

#[derive(Tabled)]
pub struct ArtistTableRow {
    pub name: String,
    pub id: String,
    pub genres: String,
}

impl From<&Artist> for ArtistTableRow {
    fn from(a: &Artist) -> Self {
        Self {
            name: a.name.clone(),
            id: a.id.clone(),
            genres: a.genres.join(" | "),
        }
    }
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub id: String,
}

impl From<&Playlist> for PlaylistTableRow {
    fn from(p: &Playlist) -> Self {
        Self {
            name: p.name.clone(),
            id: p.id.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct AlbumTableRow {
    pub date: String,
    pub name: String,
    pub group: String,
    pub id: String,
}

impl From<&Album> for AlbumTableRow {
    fn from(a: &Album) -> Self {
        Self {
            date: a.release_date.clone(),
            name: a.name.clone(),
            group: a.release_group.to_string(),
            id: a.id.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub position: String,
    pub name: String,
    pub artists: String,
    pub length: String,
    pub id: String,
}

impl From<&Track> for TrackTableRow {
    fn from(t: &Track) -> Self {
        Self {
            position: format!("{}-{:02}", t.disc_number, t.track_number),
            name: t.name.clone(),
            artists: t.artist_names.join("|"),
            length: format!("{}:{:02}", t.duration_seconds / 60, t.duration_seconds % 60),
            id: t.id.clone(),
        }
    }
}

/// What the OAuth callback handler hands back to the waiting authorization flow.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationState {
    pub code: Option<String>,
    pub error: Option<String>,
}
