mod common;

use std::path::Path;

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::{Value, json};
use spotreview::{
    Error,
    cli::{FailurePolicy, ReviewOutcome, review_artist_discography},
    management::{LedgerEntry, ReviewLedger},
};
use tempfile::tempdir;

use common::{FixedAnswer, artist_album_json, fresh_client, full_album_json, page, track_json};

const ARTIST: &str = "artist-x";
const PLAYLIST: &str = "pending-id";

async fn mock_playlists(server: &mut ServerGuard) -> Mock {
    server
        .mock("GET", "/me/playlists")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            page(
                vec![
                    json!({ "id": "other-id", "name": "Favourites" }),
                    json!({ "id": PLAYLIST, "name": "Pending Review" }),
                ],
                2,
            )
            .to_string(),
        )
        .create_async()
        .await
}

async fn mock_artist_albums(server: &mut ServerGuard, album_ids: &[String]) -> Mock {
    let items: Vec<Value> = album_ids.iter().map(|id| artist_album_json(id)).collect();
    server
        .mock("GET", format!("/artists/{}/albums", ARTIST).as_str())
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page(items, album_ids.len()).to_string())
        .create_async()
        .await
}

/// Expects exactly one several-albums request for `album_ids`; every album
/// holds one track by the reviewed artist.
async fn mock_album_batch(server: &mut ServerGuard, album_ids: &[String]) -> Mock {
    let albums: Vec<Value> = album_ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            full_album_json(
                id,
                vec![track_json(
                    &format!("{}-t", id),
                    &format!("Song of {}", id),
                    &[ARTIST],
                    180_000 + i as u64 * 1000,
                )],
            )
        })
        .collect();
    server
        .mock("GET", "/albums")
        .match_query(Matcher::UrlEncoded("ids".into(), album_ids.join(",")))
        .with_status(200)
        .with_body(json!({ "albums": albums }).to_string())
        .expect(1)
        .create_async()
        .await
}

async fn mock_upload(server: &mut ServerGuard, status: usize, hits: usize) -> Mock {
    server
        .mock("POST", format!("/playlists/{}/tracks", PLAYLIST).as_str())
        .with_status(status)
        .with_body(json!({ "snapshot_id": "snap" }).to_string())
        .expect(hits)
        .create_async()
        .await
}

async fn mock_follow(server: &mut ServerGuard, status: usize, hits: usize) -> Mock {
    server
        .mock("PUT", "/me/following")
        .match_query(Matcher::UrlEncoded("ids".into(), ARTIST.into()))
        .with_status(status)
        .expect(hits)
        .create_async()
        .await
}

fn album_ids(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("alb{:02}", i)).collect()
}

/// Writes a ledger that marks the first `count` albums as reviewed.
async fn seed_ledger(path: &Path, albums: &[String], count: usize) {
    let mut ledger = ReviewLedger::new(path);
    ledger.extend(albums[..count].iter().map(|id| LedgerEntry {
        track_id: format!("{}-t", id),
        album_id: id.clone(),
    }));
    ledger.persist().await.unwrap();
}

fn completed(outcome: ReviewOutcome) -> spotreview::cli::ReviewSummary {
    match outcome {
        ReviewOutcome::Completed(summary) => summary,
        other => panic!("expected a completed review, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reviewed_albums_are_not_fetched_again() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.csv");
    let albums = album_ids(25);
    seed_ledger(&ledger_path, &albums, 5).await;

    let _playlists = mock_playlists(&mut server).await;
    let _albums = mock_artist_albums(&mut server, &albums).await;
    let batch = mock_album_batch(&mut server, &albums[5..]).await;
    let upload = mock_upload(&mut server, 201, 1).await;
    let follow = mock_follow(&mut server, 204, 1).await;

    let mut client = fresh_client(&server.url());
    let outcome = review_artist_discography(
        &mut client,
        ARTIST,
        &ledger_path,
        &mut FixedAnswer("Y"),
        FailurePolicy::Continue,
    )
    .await
    .unwrap();

    let summary = completed(outcome);
    assert_eq!(summary.albums_found, 25);
    assert_eq!(summary.albums_pending, 20);
    assert_eq!(summary.album_requests, 1);
    assert_eq!(summary.candidates, 20);
    assert_eq!(summary.uploaded_batches, vec![20]);
    assert!(summary.followed);
    batch.assert_async().await;
    upload.assert_async().await;
    follow.assert_async().await;

    let ledger = ReviewLedger::load(&ledger_path).await.unwrap();
    assert_eq!(ledger.len(), 25);
    assert!(albums.iter().all(|id| ledger.contains_album(id)));
}

#[tokio::test]
async fn test_albums_are_fetched_twenty_at_a_time() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.csv");
    let albums = album_ids(45);
    seed_ledger(&ledger_path, &albums, 5).await;

    let _playlists = mock_playlists(&mut server).await;
    let _albums = mock_artist_albums(&mut server, &albums).await;
    let first = mock_album_batch(&mut server, &albums[5..25]).await;
    let second = mock_album_batch(&mut server, &albums[25..45]).await;
    let _upload = mock_upload(&mut server, 201, 1).await;
    let _follow = mock_follow(&mut server, 204, 1).await;

    let mut client = fresh_client(&server.url());
    let summary = completed(
        review_artist_discography(
            &mut client,
            ARTIST,
            &ledger_path,
            &mut FixedAnswer("Y"),
            FailurePolicy::Continue,
        )
        .await
        .unwrap(),
    );

    assert_eq!(summary.album_requests, 2);
    assert_eq!(summary.candidates, 40);
    first.assert_async().await;
    second.assert_async().await;
}

#[tokio::test]
async fn test_candidates_are_uploaded_in_batches_of_one_hundred() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.csv");
    let albums = album_ids(10);

    let full_albums: Vec<Value> = albums
        .iter()
        .map(|id| {
            let tracks = (0..25)
                .map(|n| {
                    track_json(
                        &format!("{}-t{}", id, n),
                        &format!("{} song {}", id, n),
                        &[ARTIST],
                        200_000,
                    )
                })
                .collect();
            full_album_json(id, tracks)
        })
        .collect();

    let _playlists = mock_playlists(&mut server).await;
    let _albums = mock_artist_albums(&mut server, &albums).await;
    let _several = server
        .mock("GET", "/albums")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "albums": full_albums }).to_string())
        .expect(1)
        .create_async()
        .await;
    let upload = mock_upload(&mut server, 201, 3).await;
    let _follow = mock_follow(&mut server, 204, 1).await;

    let mut client = fresh_client(&server.url());
    let summary = completed(
        review_artist_discography(
            &mut client,
            ARTIST,
            &ledger_path,
            &mut FixedAnswer("Y"),
            FailurePolicy::Continue,
        )
        .await
        .unwrap(),
    );

    assert_eq!(summary.candidates, 250);
    assert_eq!(summary.uploaded_batches, vec![100, 100, 50]);
    assert_eq!(summary.uploaded(), 250);
    assert_eq!(summary.ledger_entries_added, 250);
    upload.assert_async().await;

    assert_eq!(ReviewLedger::load(&ledger_path).await.unwrap().len(), 250);
}

#[tokio::test]
async fn test_foreign_reviewed_and_rereleased_tracks_are_not_uploaded() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.csv");
    std::fs::write(&ledger_path, "track_id,album_id\nknown,elsewhere\n").unwrap();

    let albums = vec!["original".to_string(), "deluxe".to_string()];
    let _playlists = mock_playlists(&mut server).await;
    let _albums = mock_artist_albums(&mut server, &albums).await;
    let _several = server
        .mock("GET", "/albums")
        .match_query(Matcher::UrlEncoded("ids".into(), "original,deluxe".into()))
        .with_status(200)
        .with_body(
            json!({
                "albums": [
                    full_album_json("original", vec![
                        track_json("hit", "Hit", &[ARTIST, "feat"], 200_400),
                        track_json("other", "Not Ours", &["artist-y"], 150_000),
                    ]),
                    full_album_json("deluxe", vec![
                        track_json("hit-deluxe", "Hit", &["feat", ARTIST], 199_600),
                        track_json("known", "Known", &[ARTIST], 100_000),
                        track_json("bonus", "Bonus", &[ARTIST], 100_000),
                    ]),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;
    let upload = server
        .mock("POST", format!("/playlists/{}/tracks", PLAYLIST).as_str())
        .match_body(Matcher::Json(json!({
            "uris": ["spotify:track:hit", "spotify:track:bonus"]
        })))
        .with_status(201)
        .with_body(json!({ "snapshot_id": "snap" }).to_string())
        .expect(1)
        .create_async()
        .await;
    let _follow = mock_follow(&mut server, 204, 1).await;

    let mut client = fresh_client(&server.url());
    let summary = completed(
        review_artist_discography(
            &mut client,
            ARTIST,
            &ledger_path,
            &mut FixedAnswer("Y"),
            FailurePolicy::Continue,
        )
        .await
        .unwrap(),
    );

    assert_eq!(summary.tracks_considered, 3);
    assert_eq!(summary.candidates, 2);
    upload.assert_async().await;

    // The skipped re-release is still recorded as reviewed
    let ledger = ReviewLedger::load(&ledger_path).await.unwrap();
    assert!(ledger.contains_track("hit-deluxe"));
    assert!(!ledger.contains_track("other"));
    assert_eq!(ledger.len(), 4);
}

#[tokio::test]
async fn test_missing_pending_review_playlist() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.csv");

    let _playlists = server
        .mock("GET", "/me/playlists")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(page(vec![json!({ "id": "other-id", "name": "Favourites" })], 1).to_string())
        .create_async()
        .await;
    let albums = server
        .mock("GET", format!("/artists/{}/albums", ARTIST).as_str())
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut client = fresh_client(&server.url());
    let result = review_artist_discography(
        &mut client,
        ARTIST,
        &ledger_path,
        &mut FixedAnswer("Y"),
        FailurePolicy::Continue,
    )
    .await;

    assert!(matches!(result, Err(Error::Config(_))));
    albums.assert_async().await;
    assert!(!ledger_path.exists());
}

#[tokio::test]
async fn test_declined_confirmation_writes_nothing() {
    for answer in ["n", "y", "Y ", "yes", ""] {
        let mut server = Server::new_async().await;
        let dir = tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.csv");
        let albums = album_ids(3);

        let _playlists = mock_playlists(&mut server).await;
        let _albums = mock_artist_albums(&mut server, &albums).await;
        let _batch = mock_album_batch(&mut server, &albums).await;
        let upload = mock_upload(&mut server, 201, 0).await;
        let follow = mock_follow(&mut server, 204, 0).await;

        let mut client = fresh_client(&server.url());
        let outcome = review_artist_discography(
            &mut client,
            ARTIST,
            &ledger_path,
            &mut FixedAnswer(answer),
            FailurePolicy::Continue,
        )
        .await
        .unwrap();

        assert_eq!(outcome, ReviewOutcome::Aborted { candidates: 3 });
        upload.assert_async().await;
        follow.assert_async().await;
        assert!(!ledger_path.exists(), "ledger written after answer {:?}", answer);
    }
}

#[tokio::test]
async fn test_nothing_new_still_needs_confirmation_to_follow() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.csv");

    let _playlists = mock_playlists(&mut server).await;
    let _albums = mock_artist_albums(&mut server, &[]).await;
    let upload = mock_upload(&mut server, 201, 0).await;
    let follow = mock_follow(&mut server, 204, 0).await;

    let mut client = fresh_client(&server.url());
    let outcome = review_artist_discography(
        &mut client,
        ARTIST,
        &ledger_path,
        &mut FixedAnswer("n"),
        FailurePolicy::Continue,
    )
    .await
    .unwrap();

    assert_eq!(outcome, ReviewOutcome::Aborted { candidates: 0 });
    upload.assert_async().await;
    follow.assert_async().await;
    assert!(!ledger_path.exists());
}

#[tokio::test]
async fn test_nothing_new_confirmed_follows_without_upload() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.csv");
    let albums = album_ids(2);
    seed_ledger(&ledger_path, &albums, 2).await;

    let _playlists = mock_playlists(&mut server).await;
    let _albums = mock_artist_albums(&mut server, &albums).await;
    let several = server
        .mock("GET", "/albums")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let upload = mock_upload(&mut server, 201, 0).await;
    let follow = mock_follow(&mut server, 204, 1).await;

    let mut client = fresh_client(&server.url());
    let summary = completed(
        review_artist_discography(
            &mut client,
            ARTIST,
            &ledger_path,
            &mut FixedAnswer("Y"),
            FailurePolicy::Continue,
        )
        .await
        .unwrap(),
    );

    assert_eq!(summary.album_requests, 0);
    assert_eq!(summary.candidates, 0);
    assert!(summary.uploaded_batches.is_empty());
    assert!(summary.followed);
    several.assert_async().await;
    upload.assert_async().await;
    follow.assert_async().await;
    assert_eq!(ReviewLedger::load(&ledger_path).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_upload_is_reported_and_run_continues() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.csv");
    let albums = album_ids(2);

    let _playlists = mock_playlists(&mut server).await;
    let _albums = mock_artist_albums(&mut server, &albums).await;
    let _batch = mock_album_batch(&mut server, &albums).await;
    let _upload = mock_upload(&mut server, 403, 1).await;
    let follow = mock_follow(&mut server, 204, 1).await;

    let mut client = fresh_client(&server.url());
    let summary = completed(
        review_artist_discography(
            &mut client,
            ARTIST,
            &ledger_path,
            &mut FixedAnswer("Y"),
            FailurePolicy::Continue,
        )
        .await
        .unwrap(),
    );

    assert_eq!(summary.failed_batches, 1);
    assert!(summary.uploaded_batches.is_empty());
    assert!(summary.followed);
    follow.assert_async().await;
    assert_eq!(ReviewLedger::load(&ledger_path).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_upload_aborts_with_abort_policy() {
    let mut server = Server::new_async().await;
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("ledger.csv");
    let albums = album_ids(2);

    let _playlists = mock_playlists(&mut server).await;
    let _albums = mock_artist_albums(&mut server, &albums).await;
    let _batch = mock_album_batch(&mut server, &albums).await;
    let _upload = mock_upload(&mut server, 403, 1).await;
    let follow = mock_follow(&mut server, 204, 0).await;

    let mut client = fresh_client(&server.url());
    let result = review_artist_discography(
        &mut client,
        ARTIST,
        &ledger_path,
        &mut FixedAnswer("Y"),
        FailurePolicy::Abort,
    )
    .await;

    assert_eq!(result.unwrap_err().status(), Some(403));
    follow.assert_async().await;
    assert!(!ledger_path.exists());
}

#[tokio::test]
async fn test_failed_follow_depends_on_policy() {
    for policy in [FailurePolicy::Continue, FailurePolicy::Abort] {
        let mut server = Server::new_async().await;
        let dir = tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.csv");
        let albums = album_ids(1);

        let _playlists = mock_playlists(&mut server).await;
        let _albums = mock_artist_albums(&mut server, &albums).await;
        let _batch = mock_album_batch(&mut server, &albums).await;
        let _upload = mock_upload(&mut server, 201, 1).await;
        let _follow = mock_follow(&mut server, 403, 1).await;

        let mut client = fresh_client(&server.url());
        let result = review_artist_discography(
            &mut client,
            ARTIST,
            &ledger_path,
            &mut FixedAnswer("Y"),
            policy,
        )
        .await;

        match policy {
            FailurePolicy::Continue => assert!(!completed(result.unwrap()).followed),
            FailurePolicy::Abort => assert_eq!(result.unwrap_err().status(), Some(403)),
        }
        // The ledger is written before the follow either way
        assert_eq!(ReviewLedger::load(&ledger_path).await.unwrap().len(), 1);
    }
}
