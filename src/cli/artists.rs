use tabled::Table;

use crate::{
    Res, info, success,
    types::{AlbumTableRow, ArtistTableRow},
};

/// Lists followed artists sorted by name, optionally filtered by `search`.
pub async fn list_artists(search: Option<String>) -> Res<()> {
    let mut client = super::connect().await?;

    let pb = super::spinner("Fetching followed artists...");
    let result = client.get_followed_artists().await;
    pb.finish_and_clear();
    super::save_credential(&mut client).await?;

    let mut artists = result?;
    artists.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

    if let Some(search) = search {
        let search_term = search.to_lowercase();
        artists.retain(|a| a.name.to_lowercase().contains(&search_term));
    }

    if artists.is_empty() {
        info!("No artists found.");
        return Ok(());
    }

    let rows: Vec<ArtistTableRow> = artists.iter().map(ArtistTableRow::from).collect();
    println!("{}", Table::new(rows));
    success!("{} artists", artists.len());
    Ok(())
}

/// Follows an artist as the current user.
pub async fn follow(artist_id: String) -> Res<()> {
    let mut client = super::connect().await?;
    let result = client.follow_artist(&artist_id).await;
    super::save_credential(&mut client).await?;

    result?;
    success!("Successfully followed {}", artist_id);
    Ok(())
}

/// Lists an artist's albums, singles, compilations and appearances.
pub async fn list_albums(artist_id: String) -> Res<()> {
    let mut client = super::connect().await?;

    let pb = super::spinner(format!("Fetching albums of {}...", artist_id));
    let result = client.get_artist_albums(&artist_id).await;
    pb.finish_and_clear();
    super::save_credential(&mut client).await?;

    let albums = result?;
    let rows: Vec<AlbumTableRow> = albums.iter().map(AlbumTableRow::from).collect();
    println!("{}", Table::new(rows));
    success!("{} albums identified from {}.", albums.len(), artist_id);
    Ok(())
}
