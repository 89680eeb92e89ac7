use tabled::Table;

use crate::{
    Res, info, success,
    types::{PlaylistTableRow, TrackTableRow},
};

/// Lists the playlists owned or followed by the current user.
pub async fn list_playlists() -> Res<()> {
    let mut client = super::connect().await?;

    let pb = super::spinner("Fetching playlists...");
    let result = client.get_current_user_playlists().await;
    pb.finish_and_clear();
    super::save_credential(&mut client).await?;

    let playlists = result?;
    let rows: Vec<PlaylistTableRow> = playlists.iter().map(PlaylistTableRow::from).collect();
    println!("{}", Table::new(rows));
    Ok(())
}

/// Creates a private playlist unless one with the same name exists.
pub async fn create_playlist(name: String, description: Option<String>) -> Res<()> {
    let mut client = super::connect().await?;
    let result = client
        .create_playlist(&name, description.as_deref().unwrap_or_default())
        .await;
    super::save_credential(&mut client).await?;

    if let Some(playlist) = result? {
        success!("Successfully created playlist {} ({}).", playlist.name, playlist.id);
    }
    Ok(())
}

/// Lists the tracks of a playlist with the date each was added.
pub async fn playlist_items(playlist_id: String) -> Res<()> {
    let mut client = super::connect().await?;

    let pb = super::spinner(format!("Fetching tracks of playlist {}...", playlist_id));
    let result = client.get_playlist_items(&playlist_id).await;
    pb.finish_and_clear();
    super::save_credential(&mut client).await?;

    let tracks = result?;
    let rows: Vec<TrackTableRow> = tracks.iter().map(TrackTableRow::from).collect();
    println!("{}", Table::new(rows));

    if let Some(latest) = tracks.iter().filter_map(|t| t.added_at).max() {
        info!("{} tracks, last added {}", tracks.len(), latest.format("%Y-%m-%d"));
    }
    Ok(())
}
