use tabled::Table;

use crate::{Res, spotify::MAX_ALBUM_BATCH, success, types::TrackTableRow};

/// Lists the tracks of one or more albums.
pub async fn album_tracks(album_ids: Vec<String>) -> Res<()> {
    let mut client = super::connect().await?;

    let pb = super::spinner("Fetching album tracks...");
    let mut tracks = Vec::new();
    let mut failure = None;
    for chunk in album_ids.chunks(MAX_ALBUM_BATCH) {
        match client.get_several_albums_tracks(chunk).await {
            Ok(t) => tracks.extend(t),
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }
    pb.finish_and_clear();
    super::save_credential(&mut client).await?;

    if let Some(e) = failure {
        return Err(e.into());
    }

    let rows: Vec<TrackTableRow> = tracks.iter().map(TrackTableRow::from).collect();
    println!("{}", Table::new(rows));
    success!("{} tracks on {} albums", tracks.len(), album_ids.len());
    Ok(())
}
