mod common;

use chrono::Utc;
use mockito::{Matcher, Server};
use serde_json::json;
use spotreview::{
    Error,
    spotify::{
        SpotifyClient,
        auth::{Authenticator, REFRESH_MARGIN_SECS},
    },
    types::Credential,
};

use common::{FixedCode, client_expiring_in, test_config};

// base64("test_id:test_secret")
const BASIC_AUTH: &str = "Basic dGVzdF9pZDp0ZXN0X3NlY3JldA==";

#[tokio::test]
async fn test_token_close_to_expiry_is_refreshed_first() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/api/token")
        .match_header("authorization", BASIC_AUTH)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
            Matcher::UrlEncoded("refresh_token".into(), "refresh-token".into()),
        ]))
        .with_status(200)
        .with_body(json!({ "access_token": "new-token", "expires_in": 3600 }).to_string())
        .expect(1)
        .create_async()
        .await;
    let me = server
        .mock("GET", "/me")
        .match_header("authorization", "Bearer new-token")
        .with_status(200)
        .with_body(json!({ "id": "user" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let mut client = client_expiring_in(&server.url(), "old-token", 500);
    let user_id = client.get_user_id().await.unwrap();

    assert_eq!(user_id, "user");
    token.assert_async().await;
    me.assert_async().await;

    let credential = client.auth().credential().unwrap();
    assert_eq!(credential.access_token, "new-token");
    assert_eq!(credential.refresh_token, "refresh-token");
    assert!(credential.expires_at > Utc::now().timestamp() + REFRESH_MARGIN_SECS);
    assert!(client.auth_mut().take_changed());
    assert!(!client.auth_mut().take_changed());
}

#[tokio::test]
async fn test_token_outside_margin_is_used_as_is() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/api/token")
        .expect(0)
        .create_async()
        .await;
    let me = server
        .mock("GET", "/me")
        .match_header("authorization", "Bearer old-token")
        .with_status(200)
        .with_body(json!({ "id": "user" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let mut client = client_expiring_in(&server.url(), "old-token", 700);
    client.get_user_id().await.unwrap();

    token.assert_async().await;
    me.assert_async().await;
    assert!(!client.auth_mut().take_changed());
}

#[tokio::test]
async fn test_refresh_keeps_rotated_refresh_token() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_body(
            json!({ "access_token": "new-token", "refresh_token": "rotated", "expires_in": 3600 })
                .to_string(),
        )
        .create_async()
        .await;

    let mut client = client_expiring_in(&server.url(), "", 0);
    client.auth_mut().refresh_access_credential().await.unwrap();

    assert_eq!(client.auth().credential().unwrap().refresh_token, "rotated");
}

#[tokio::test]
async fn test_rejected_refresh_is_an_auth_error() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/api/token")
        .with_status(400)
        .with_body(
            json!({ "error": "invalid_grant", "error_description": "Refresh token revoked" })
                .to_string(),
        )
        .create_async()
        .await;
    let me = server.mock("GET", "/me").expect(0).create_async().await;

    let mut client = client_expiring_in(&server.url(), "old-token", 10);
    let err = client.get_user_id().await.unwrap_err();

    match err {
        Error::Auth(message) => assert!(message.contains("Refresh token revoked")),
        other => panic!("expected auth error, got {:?}", other),
    }
    me.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_response_forces_one_refresh() {
    let mut server = Server::new_async().await;
    let stale = server
        .mock("GET", "/me")
        .match_header("authorization", "Bearer revoked-token")
        .with_status(401)
        .with_body(json!({ "error": { "status": 401, "message": "The access token expired" } }).to_string())
        .expect(1)
        .create_async()
        .await;
    let token = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_body(json!({ "access_token": "new-token", "expires_in": 3600 }).to_string())
        .expect(1)
        .create_async()
        .await;
    let fresh = server
        .mock("GET", "/me")
        .match_header("authorization", "Bearer new-token")
        .with_status(200)
        .with_body(json!({ "id": "user" }).to_string())
        .expect(1)
        .create_async()
        .await;

    let mut client = client_expiring_in(&server.url(), "revoked-token", 3600);
    assert_eq!(client.get_user_id().await.unwrap(), "user");

    stale.assert_async().await;
    token.assert_async().await;
    fresh.assert_async().await;
}

#[tokio::test]
async fn test_acquire_refresh_credential() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/api/token")
        .match_header("authorization", BASIC_AUTH)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("grant_type".into(), "authorization_code".into()),
            Matcher::UrlEncoded("code".into(), "the-code".into()),
            Matcher::UrlEncoded(
                "redirect_uri".into(),
                "http://127.0.0.1:8888/callback".into(),
            ),
        ]))
        .with_status(200)
        .with_body(
            json!({ "access_token": "access", "refresh_token": "refresh", "expires_in": 3600 })
                .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let config = test_config(&server.url());
    let client = SpotifyClient::new(config.clone()).unwrap();
    let mut auth = Authenticator::new(client.http().clone(), config);
    let mut prompt = FixedCode {
        code: "the-code",
        shown_url: None,
    };

    let credential = auth.acquire_refresh_credential(&mut prompt).await.unwrap();
    assert_eq!(credential.refresh_token, "refresh");
    assert_eq!(credential.access_token, "access");
    token.assert_async().await;

    let shown = prompt.shown_url.unwrap();
    assert!(shown.starts_with(&format!("{}/authorize?", server.url())));
    assert!(shown.contains("client_id=test_id"));
    assert!(shown.contains("response_type=code"));
    assert!(shown.contains("redirect_uri=http%3A%2F%2F127.0.0.1%3A8888%2Fcallback"));
    assert!(auth.take_changed());
}

#[tokio::test]
async fn test_acquire_without_refresh_token_fails() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/api/token")
        .with_status(200)
        .with_body(json!({ "access_token": "access", "expires_in": 3600 }).to_string())
        .create_async()
        .await;

    let config = test_config(&server.url());
    let client = SpotifyClient::new(config.clone()).unwrap();
    let mut auth = Authenticator::new(client.http().clone(), config);
    let mut prompt = FixedCode {
        code: "the-code",
        shown_url: None,
    };

    let result = auth.acquire_refresh_credential(&mut prompt).await;
    assert!(matches!(result, Err(Error::Auth(_))));
    assert!(auth.credential().is_none());
}

#[test]
fn test_needs_refresh_boundaries() {
    let config = test_config("http://127.0.0.1:1");
    let now = 1_700_000_000;
    let auth = |expires_at: i64, access: &str| {
        Authenticator::new(reqwest::Client::new(), config.clone()).with_credential(Credential {
            refresh_token: "refresh".to_string(),
            access_token: access.to_string(),
            expires_at,
        })
    };

    assert!(auth(now + 500, "token").needs_refresh(now));
    assert!(auth(now + REFRESH_MARGIN_SECS, "token").needs_refresh(now));
    assert!(!auth(now + REFRESH_MARGIN_SECS + 1, "token").needs_refresh(now));
    assert!(!auth(now + 700, "token").needs_refresh(now));
    assert!(auth(now + 3600, "").needs_refresh(now));
    assert!(Authenticator::new(reqwest::Client::new(), config.clone()).needs_refresh(now));
}

#[test]
fn test_configured_refresh_token_seeds_credential() {
    let mut config = test_config("http://127.0.0.1:1");
    config.refresh_token = Some("from-env".to_string());

    let auth = Authenticator::new(reqwest::Client::new(), config);

    assert_eq!(
        auth.credential(),
        Some(&Credential::from_refresh_token("from-env"))
    );
    assert!(auth.needs_refresh(Utc::now().timestamp()));
}
