//! # Spotify Integration Module
//!
//! Authenticated access to the Spotify Web API. [`SpotifyClient`] owns the HTTP
//! client and the [`auth::Authenticator`]; the submodules add the endpoint
//! groups as further `impl SpotifyClient` blocks:
//!
//! ```text
//! SpotifyClient
//!     ├── auth      (authorization code flow, refresh guard)
//!     ├── artists   (followed artists, follow, artist albums)
//!     ├── playlist  (list, create, items, add tracks)
//!     └── releases  (album tracks, several albums)
//! ```
//!
//! Every request goes through [`SpotifyClient::send`], which
//! - asks the authenticator for a fresh access token (refreshing when the
//!   current one expires within ten minutes),
//! - retries connect errors, timeouts and 502/503/504 with exponential backoff,
//! - waits out `429 Too Many Requests` according to `Retry-After`,
//! - refreshes once and retries when the API answers `401`.
//!
//! List endpoints page through results with [`SpotifyClient::fetch_all`],
//! using either `offset` or `after` cursors. Paging stops once the number of
//! collected items reaches the `total` reported by the API; an empty page
//! before that point is reported as [`Error::Data`].

pub mod artists;
pub mod auth;
pub mod playlist;
pub mod releases;

use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::sleep;

use crate::{
    config::SpotifyConfig,
    error::{Error, Result},
    types::{Paging, UserProfile},
    warning,
};

use self::auth::Authenticator;

/// Items requested per page on every paginated endpoint.
pub const PAGE_SIZE: usize = 50;

/// Most track URIs the API accepts in one add-to-playlist request.
pub const MAX_PLAYLIST_BATCH: usize = 100;

/// Most album ids the API accepts in one several-albums request.
pub const MAX_ALBUM_BATCH: usize = 20;

/// Longest `Retry-After` the client is willing to sleep through.
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// How a list endpoint advances from one page to the next.
pub(crate) enum Pagination<T> {
    /// `offset` grows by the page size.
    Offset,
    /// `after` is set to the identifier of the last item received.
    Cursor(fn(&T) -> String),
}

/// Client for the Spotify Web API.
pub struct SpotifyClient {
    http: Client,
    config: SpotifyConfig,
    auth: Authenticator,
    user_id: Option<String>,
}

impl SpotifyClient {
    /// Creates a client with a request timeout taken from `config`.
    ///
    /// The credential is seeded from `config.refresh_token` when present; use
    /// [`SpotifyClient::with_authenticator`] or [`SpotifyClient::auth_mut`] to
    /// supply one otherwise.
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        let auth = Authenticator::new(http.clone(), config.clone());
        Ok(Self {
            http,
            config,
            auth,
            user_id: None,
        })
    }

    /// Replaces the authenticator, e.g. with one holding a stored credential.
    pub fn with_authenticator(mut self, auth: Authenticator) -> Self {
        self.auth = auth;
        self
    }

    /// Underlying HTTP client, shared with the authenticator.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Configuration the client was built with.
    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    /// Authenticator holding the current credential.
    pub fn auth(&self) -> &Authenticator {
        &self.auth
    }

    /// Mutable access to the authenticator, for the authorization flow.
    pub fn auth_mut(&mut self) -> &mut Authenticator {
        &mut self.auth
    }

    /// Retrieves the Spotify user id of the current user.
    pub async fn get_user_id(&mut self) -> Result<String> {
        let profile: UserProfile = self.get_json("/me", &[]).await?;
        self.user_id = Some(profile.id.clone());
        Ok(profile.id)
    }

    /// User id of the current user, fetched once and then reused.
    pub async fn user_id(&mut self) -> Result<String> {
        match &self.user_id {
            Some(id) => Ok(id.clone()),
            None => self.get_user_id().await,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Sends an authenticated request and returns the raw response.
    ///
    /// The access token is checked (and refreshed if stale) before every
    /// attempt. Transient failures are retried up to `config.max_retries`
    /// times; the final response is returned whatever its status, callers
    /// decide which statuses count as success.
    pub(crate) async fn send(
        &mut self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Response> {
        let url = self.url(path);
        let mut attempt: u32 = 0;
        let mut reauthenticated = false;

        loop {
            let token = self.auth.access_token().await?;
            tracing::debug!(%method, %url, attempt, "sending request");

            let mut request = self
                .http
                .request(method.clone(), &url)
                .bearer_auth(token)
                .query(query);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(err) if (err.is_timeout() || err.is_connect()) && attempt < self.config.max_retries => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(%url, error = %err, ?delay, "transient network failure, retrying");
                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let status = response.status();
            if status == StatusCode::UNAUTHORIZED && !reauthenticated {
                tracing::debug!(%url, "access token rejected, refreshing");
                self.auth.refresh_access_credential().await?;
                reauthenticated = true;
                continue;
            }

            if attempt >= self.config.max_retries {
                return Ok(response);
            }

            match status {
                StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse::<u64>().ok())
                        .unwrap_or(1);
                    if retry_after > MAX_RETRY_AFTER_SECS {
                        warning!(
                            "Retry after has reached an abnormal high of {} seconds. Try again later.",
                            retry_after
                        );
                        return Ok(response);
                    }
                    tracing::warn!(%url, retry_after, "rate limited, waiting");
                    sleep(Duration::from_secs(retry_after)).await;
                }
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => {
                    let delay = self.backoff(attempt);
                    tracing::warn!(%url, %status, ?delay, "server error, retrying");
                    sleep(delay).await;
                }
                _ => return Ok(response),
            }
            attempt += 1;
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.config.retry_base_delay * 2u32.saturating_pow(attempt)
    }

    /// GET `path` and decode a 200 response as `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &mut self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.send(Method::GET, path, query, None).await?;
        let body = expect_status(response, &[StatusCode::OK]).await?;
        decode(path, &body)
    }

    /// Collects every item of a paginated endpoint.
    ///
    /// `unwrap` extracts the [`Paging`] object from the decoded page `R`,
    /// which is the page itself on most endpoints and nested one level deep on
    /// `/me/following`.
    ///
    /// # Termination
    ///
    /// Stops once the number of collected items reaches the `total` reported
    /// by the latest page, so at most `ceil(total / PAGE_SIZE)` requests are
    /// made. A page without items before `total` is reached means the API and
    /// its own count disagree and yields [`Error::Data`] instead of looping.
    pub(crate) async fn fetch_all<R, T>(
        &mut self,
        path: &str,
        params: &[(&str, String)],
        pagination: Pagination<T>,
        unwrap: fn(R) -> Paging<T>,
    ) -> Result<Vec<T>>
    where
        R: DeserializeOwned,
    {
        let mut items: Vec<T> = Vec::new();
        let mut offset: usize = 0;
        let mut after: Option<String> = None;

        loop {
            let mut query: Vec<(&str, String)> = params.to_vec();
            query.push(("limit", PAGE_SIZE.to_string()));
            match &pagination {
                Pagination::Offset => query.push(("offset", offset.to_string())),
                Pagination::Cursor(_) => {
                    if let Some(cursor) = &after {
                        query.push(("after", cursor.clone()));
                    }
                }
            }

            let page = unwrap(self.get_json::<R>(path, &query).await?);
            let total = usize::try_from(page.total)
                .map_err(|_| Error::Data(format!("{}: total out of range", path)))?;
            let received = page.items.len();
            tracing::debug!(path, received, collected = items.len(), total, "page received");

            if received == 0 {
                if items.len() < total {
                    return Err(Error::Data(format!(
                        "{}: empty page after {} of {} items",
                        path,
                        items.len(),
                        total
                    )));
                }
                return Ok(items);
            }

            if let Pagination::Cursor(cursor_of) = &pagination {
                after = page.items.last().map(|item| cursor_of(item));
            }
            offset += received;
            items.extend(page.items);

            if items.len() >= total {
                return Ok(items);
            }
        }
    }
}

/// Reads the body of `response`, turning any status outside `expected` into
/// [`Error::Transport`] with the server supplied message.
pub(crate) async fn expect_status(response: Response, expected: &[StatusCode]) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;
    if expected.contains(&status) {
        Ok(body)
    } else {
        Err(Error::Transport {
            status: status.as_u16(),
            message: server_message(&body),
        })
    }
}

pub(crate) fn decode<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| Error::Data(format!("{}: {}", path, e)))
}

/// Best effort extraction of the human readable message from an error body.
///
/// Understands both the Web API shape (`{"error": {"status", "message"}}`) and
/// the accounts service shape (`{"error", "error_description"}`).
pub(crate) fn server_message(body: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() {
            "no error message".to_string()
        } else {
            trimmed.to_string()
        };
    };

    if let Some(msg) = json["error"]["message"].as_str() {
        return msg.to_string();
    }
    if let Some(desc) = json["error_description"].as_str() {
        return desc.to_string();
    }
    if let Some(err) = json["error"].as_str() {
        return err.to_string();
    }
    json.to_string()
}
