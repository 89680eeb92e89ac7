#![allow(dead_code)]

use std::time::Duration;

use chrono::Utc;
use serde_json::{Value, json};
use spotreview::{
    cli::Prompt,
    config::SpotifyConfig,
    spotify::{
        SpotifyClient,
        auth::{Authenticator, CodePrompt},
    },
    types::Credential,
};

pub fn test_config(base: &str) -> SpotifyConfig {
    let mut config = SpotifyConfig::new(
        "test_id",
        "test_secret",
        "http://127.0.0.1:8888/callback",
        "user-follow-read playlist-modify-private",
    );
    config.api_url = base.to_string();
    config.auth_url = format!("{}/authorize", base);
    config.token_url = format!("{}/api/token", base);
    config.request_timeout = Duration::from_secs(5);
    config.max_retries = 2;
    config.retry_base_delay = Duration::from_millis(10);
    config
}

/// Client whose credential expires `expires_in` seconds from now.
pub fn client_expiring_in(base: &str, access_token: &str, expires_in: i64) -> SpotifyClient {
    let config = test_config(base);
    let client = SpotifyClient::new(config.clone()).expect("client");
    let auth = Authenticator::new(client.http().clone(), config).with_credential(Credential {
        refresh_token: "refresh-token".to_string(),
        access_token: access_token.to_string(),
        expires_at: Utc::now().timestamp() + expires_in,
    });
    client.with_authenticator(auth)
}

/// Client with a token that stays valid for the whole test.
pub fn fresh_client(base: &str) -> SpotifyClient {
    client_expiring_in(base, "access-token", 3600)
}

pub fn page(items: Vec<Value>, total: usize) -> Value {
    json!({ "items": items, "total": total, "limit": 50, "offset": 0 })
}

pub fn track_json(id: &str, name: &str, artist_ids: &[&str], duration_ms: u64) -> Value {
    let artists: Vec<Value> = artist_ids
        .iter()
        .map(|a| json!({ "id": a, "name": format!("Artist {}", a) }))
        .collect();
    json!({
        "id": id,
        "uri": format!("spotify:track:{}", id),
        "name": name,
        "artists": artists,
        "disc_number": 1,
        "track_number": 1,
        "is_playable": true,
        "duration_ms": duration_ms,
        "type": "track"
    })
}

pub fn artist_album_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Album {}", id),
        "album_group": "album",
        "album_type": "album",
        "release_date": "2020-01-01",
        "is_playable": true
    })
}

pub fn full_album_json(id: &str, tracks: Vec<Value>) -> Value {
    let total = tracks.len();
    json!({
        "id": id,
        "name": format!("Album {}", id),
        "uri": format!("spotify:album:{}", id),
        "total_tracks": total,
        "tracks": { "items": tracks, "total": total, "limit": 50, "offset": 0 }
    })
}

/// Answers every prompt with the same text.
pub struct FixedAnswer(pub &'static str);

impl Prompt for FixedAnswer {
    fn ask(&mut self, _question: &str) -> std::io::Result<String> {
        Ok(self.0.to_string())
    }
}

/// Hands out a fixed authorization code and remembers the URL it was shown.
pub struct FixedCode {
    pub code: &'static str,
    pub shown_url: Option<String>,
}

impl CodePrompt for FixedCode {
    async fn authorization_code(&mut self, authorize_url: &str) -> spotreview::Result<String> {
        self.shown_url = Some(authorize_url.to_string());
        Ok(self.code.to_string())
    }
}
