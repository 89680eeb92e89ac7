use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use crate::{
    Res,
    error::{Error, Result},
    info,
    management::{LedgerEntry, ReviewLedger},
    spotify::{MAX_ALBUM_BATCH, MAX_PLAYLIST_BATCH, SpotifyClient},
    success, utils, warning,
};

/// Name of the playlist new tracks are collected in.
pub const PENDING_REVIEW_PLAYLIST: &str = "Pending Review";

/// The only answer that lets the upload go ahead.
pub const CONFIRMATION: &str = "Y";

/// What to do when a mutating call (upload batch, follow) fails mid-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Report the failure and carry on with the remaining steps.
    #[default]
    Continue,
    /// Stop the run and return the error.
    Abort,
}

/// Asks the operator a question and returns the raw answer.
pub trait Prompt {
    fn ask(&mut self, question: &str) -> io::Result<String>;
}

/// Reads the answer from stdin.
pub struct StdinPrompt;

impl Prompt for StdinPrompt {
    fn ask(&mut self, question: &str) -> io::Result<String> {
        utils::read_line(question)
    }
}

/// Counters collected during a completed review.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    pub albums_found: usize,
    pub albums_pending: usize,
    pub album_requests: usize,
    pub tracks_considered: usize,
    pub candidates: usize,
    /// Size of every batch that made it into the playlist, in upload order.
    pub uploaded_batches: Vec<usize>,
    pub failed_batches: usize,
    pub ledger_entries_added: usize,
    pub followed: bool,
}

impl ReviewSummary {
    /// Tracks that made it into the playlist.
    pub fn uploaded(&self) -> usize {
        self.uploaded_batches.iter().sum()
    }
}

/// Result of [`review_artist_discography`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    Completed(ReviewSummary),
    /// The operator declined; nothing was written and the artist is not followed.
    Aborted { candidates: usize },
}

/// Puts every not yet reviewed track of an artist into the
/// "Pending Review" playlist.
///
/// # Steps
///
/// 1. Resolve the "Pending Review" playlist ([`Error::Config`] if missing)
/// 2. Load the ledger of reviewed `(track_id, album_id)` pairs
/// 3. List the artist's albums and drop albums already in the ledger
/// 4. Fetch tracks of the remaining albums, [`MAX_ALBUM_BATCH`] ids per request
/// 5. Keep tracks the artist plays on that are not in the ledger yet
/// 6. Collapse re-releases of the same recording, first one wins
/// 7. Ask for confirmation, even with nothing to upload; anything but
///    exactly `Y` stops here before the ledger or the follow is touched
/// 8. Upload in batches of [`MAX_PLAYLIST_BATCH`], recording each successful
///    batch in the ledger right away
/// 9. Record every track from step 5 in the ledger
/// 10. Follow the artist
///
/// Read failures in steps 1-6 abort before anything is written. Failures of
/// the mutating calls in steps 8 and 10 are handled according to `policy`.
pub async fn review_artist_discography(
    client: &mut SpotifyClient,
    artist_id: &str,
    ledger_path: &Path,
    prompt: &mut impl Prompt,
    policy: FailurePolicy,
) -> Result<ReviewOutcome> {
    let mut summary = ReviewSummary::default();

    let playlist_id = client
        .get_current_user_playlists()
        .await?
        .into_iter()
        .find(|p| p.name == PENDING_REVIEW_PLAYLIST)
        .map(|p| p.id)
        .ok_or_else(|| {
            Error::Config(format!("playlist \"{}\" not found", PENDING_REVIEW_PLAYLIST))
        })?;

    let mut ledger = ReviewLedger::load(ledger_path).await?;

    let albums = client.get_artist_albums(artist_id).await?;
    summary.albums_found = albums.len();
    info!("{} albums identified from {}.", albums.len(), artist_id);

    let mut seen_albums = HashSet::new();
    let pending_albums: Vec<String> = albums
        .into_iter()
        .map(|a| a.id)
        .filter(|id| !ledger.contains_album(id) && seen_albums.insert(id.clone()))
        .collect();
    summary.albums_pending = pending_albums.len();

    let mut tracks = Vec::new();
    for chunk in pending_albums.chunks(MAX_ALBUM_BATCH) {
        tracks.extend(client.get_several_albums_tracks(chunk).await?);
        summary.album_requests += 1;
    }

    tracks.retain(|t| t.has_artist(artist_id) && !ledger.contains_track(&t.id));
    summary.tracks_considered = tracks.len();
    let processed: Vec<LedgerEntry> = tracks.iter().map(LedgerEntry::from).collect();

    let mut candidates = tracks;
    utils::remove_duplicate_recordings(&mut candidates);
    summary.candidates = candidates.len();

    info!(
        "{} tracks to be added to {} playlist",
        candidates.len(),
        PENDING_REVIEW_PLAYLIST
    );
    let answer = prompt.ask("Enter Y to continue: ")?;
    if utils::strip_line_ending(&answer) != CONFIRMATION {
        return Ok(ReviewOutcome::Aborted {
            candidates: candidates.len(),
        });
    }

    let mut uploaded = 0;
    for batch in candidates.chunks(MAX_PLAYLIST_BATCH) {
        let uris: Vec<String> = batch.iter().map(|t| t.uri.clone()).collect();
        match client.add_items_to_playlist(&playlist_id, &uris).await {
            Ok(_) => {
                uploaded += uris.len();
                summary.uploaded_batches.push(uris.len());
                summary.ledger_entries_added += ledger.extend(batch.iter().map(LedgerEntry::from));
                ledger.persist().await?;
                info!(
                    "{} tracks successfully loaded to playlist {}",
                    uploaded, playlist_id
                );
            }
            Err(e) if policy == FailurePolicy::Abort => return Err(e),
            Err(e) => {
                summary.failed_batches += 1;
                warning!(
                    "Failed to add {} tracks to playlist {}: {}",
                    uris.len(),
                    playlist_id,
                    e
                );
            }
        }
    }

    summary.ledger_entries_added += ledger.extend(processed);
    ledger.persist().await?;
    success!("Review ledger {} updated.", ledger.path().display());

    match client.follow_artist(artist_id).await {
        Ok(()) => {
            summary.followed = true;
            success!("Successfully followed {}", artist_id);
        }
        Err(e) if policy == FailurePolicy::Abort => return Err(e),
        Err(e) => warning!("Failed to follow {}: {}", artist_id, e),
    }

    Ok(ReviewOutcome::Completed(summary))
}

/// `spotreview review <ARTIST_ID>`
pub async fn review(artist_id: String, ledger: Option<PathBuf>, abort_on_failure: bool) -> Res<()> {
    let mut client = super::connect().await?;
    let ledger_path = ledger.unwrap_or_else(crate::config::ledger_path);
    let policy = if abort_on_failure {
        FailurePolicy::Abort
    } else {
        FailurePolicy::Continue
    };

    let outcome = review_artist_discography(
        &mut client,
        &artist_id,
        &ledger_path,
        &mut StdinPrompt,
        policy,
    )
    .await;
    super::save_credential(&mut client).await?;

    match outcome? {
        ReviewOutcome::Aborted { candidates } => {
            info!("Upload of {} tracks cancelled.", candidates);
        }
        ReviewOutcome::Completed(summary) => {
            if summary.failed_batches > 0 {
                warning!(
                    "{} of {} batches failed to upload.",
                    summary.failed_batches,
                    summary.failed_batches + summary.uploaded_batches.len()
                );
            }
            success!(
                "Completed: {} of {} candidate tracks uploaded, {} ledger entries added.",
                summary.uploaded(),
                summary.candidates,
                summary.ledger_entries_added
            );
        }
    }
    Ok(())
}
