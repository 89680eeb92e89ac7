use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{
    config::SpotifyConfig,
    error::{Error, Result},
    info,
    server::start_api_server,
    types::{AuthorizationState, Credential},
    warning,
};

/// Seconds before expiry at which an access token is considered stale.
pub const REFRESH_MARGIN_SECS: i64 = 600;

const DEFAULT_EXPIRES_IN: i64 = 3600;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Source of the authorization code during the interactive flow.
#[allow(async_fn_in_trait)]
pub trait CodePrompt {
    /// Shows `authorize_url` to the user and returns the code Spotify handed back.
    async fn authorization_code(&mut self, authorize_url: &str) -> Result<String>;
}

/// Asks for the code on stdin.
///
/// Accepts either the bare code or the full redirect URL the browser landed
/// on, in which case the `code` query parameter is extracted.
pub struct StdinCodePrompt {
    pub open_browser: bool,
}

impl CodePrompt for StdinCodePrompt {
    async fn authorization_code(&mut self, authorize_url: &str) -> Result<String> {
        info!("Authorize spotreview by visiting:\n{}", authorize_url);
        if self.open_browser && webbrowser::open(authorize_url).is_err() {
            warning!("Failed to open browser. Please navigate to the URL above manually.");
        }

        let input = crate::utils::read_line("Enter authorization code: ")?;
        extract_code(&input)
            .ok_or_else(|| Error::Auth("no authorization code entered".to_string()))
    }
}

/// Captures the code through a local callback server bound to `addr`.
///
/// The redirect URI registered with Spotify has to point at this server's
/// `/callback` route.
pub struct CallbackCodePrompt {
    pub addr: String,
    pub timeout: Duration,
}

impl CodePrompt for CallbackCodePrompt {
    async fn authorization_code(&mut self, authorize_url: &str) -> Result<String> {
        let shared_state = Arc::new(Mutex::new(AuthorizationState::default()));

        let server_state = Arc::clone(&shared_state);
        let addr = self.addr.clone();
        let server = tokio::spawn(async move { start_api_server(&addr, server_state).await });

        if webbrowser::open(authorize_url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                authorize_url
            );
        }

        let result = wait_for_code(shared_state, self.timeout).await;
        server.abort();
        result
    }
}

/// Polls the shared state until the callback handler stored a code or an error.
async fn wait_for_code(
    shared_state: Arc<Mutex<AuthorizationState>>,
    max_wait: Duration,
) -> Result<String> {
    let start = std::time::Instant::now();

    while start.elapsed() < max_wait {
        {
            let lock = shared_state.lock().await;
            if let Some(code) = &lock.code {
                return Ok(code.clone());
            }
            if let Some(err) = &lock.error {
                return Err(Error::Auth(format!("authorization was denied: {}", err)));
            }
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    Err(Error::Auth("authorization timed out".to_string()))
}

fn extract_code(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    match Url::parse(input) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == "code")
            .map(|(_, v)| v.into_owned()),
        Err(_) => Some(input.to_string()),
    }
}

/// Holds the credential and keeps the access token fresh.
///
/// Every authenticated request asks [`Authenticator::access_token`] for a
/// token, which refreshes first when the current one expires within
/// [`REFRESH_MARGIN_SECS`].
pub struct Authenticator {
    http: Client,
    config: SpotifyConfig,
    credential: Option<Credential>,
    changed: bool,
}

impl Authenticator {
    /// Authenticator seeded with `config.refresh_token`, if any.
    pub fn new(http: Client, config: SpotifyConfig) -> Self {
        let credential = config
            .refresh_token
            .as_deref()
            .map(Credential::from_refresh_token);
        Self {
            http,
            config,
            credential,
            changed: false,
        }
    }

    /// Replaces whatever credential the authenticator currently holds.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Current credential, `None` before authorization.
    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// True when the credential was acquired or refreshed since the last
    /// call, i.e. it should be persisted again.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Builds the URL the user has to visit to grant access.
    pub fn authorize_url(&self) -> Result<String> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scopes.as_str()),
            ],
        )
        .map_err(|e| Error::Config(format!("invalid authorization URL: {}", e)))?;
        Ok(url.to_string())
    }

    /// Runs the authorization-code flow and stores the resulting credential.
    ///
    /// # Flow
    ///
    /// 1. Builds the authorization URL (client id, redirect URI, scopes)
    /// 2. Hands it to `prompt`, which blocks until the user supplies the code
    /// 3. Exchanges the code at the token endpoint using the client secret
    ///
    /// # Errors
    ///
    /// [`Error::Auth`] when the exchange is rejected or the response carries
    /// no refresh token.
    pub async fn acquire_refresh_credential(
        &mut self,
        prompt: &mut impl CodePrompt,
    ) -> Result<&Credential> {
        let url = self.authorize_url()?;
        let code = prompt.authorization_code(&url).await?;

        let token = self
            .token_request(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
            ])
            .await?;

        let refresh_token = token.refresh_token.ok_or_else(|| {
            Error::Auth("token response did not contain a refresh_token".to_string())
        })?;

        let mut credential = Credential::from_refresh_token(refresh_token);
        if let Some(access_token) = token.access_token {
            credential.access_token = access_token;
            credential.expires_at =
                Utc::now().timestamp() + token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN);
        }

        self.changed = true;
        Ok(self.credential.insert(credential))
    }

    /// Exchanges the refresh token for a new access token.
    pub async fn refresh_access_credential(&mut self) -> Result<()> {
        let refresh_token = self
            .credential
            .as_ref()
            .map(|c| c.refresh_token.clone())
            .ok_or_else(|| Error::Auth("no refresh token available, run `spotreview auth`".to_string()))?;

        tracing::debug!("refreshing access token");
        let token = self
            .token_request(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
            ])
            .await?;

        let access_token = token.access_token.ok_or_else(|| {
            Error::Auth("token response did not contain an access_token".to_string())
        })?;

        let credential = Credential {
            refresh_token: token.refresh_token.unwrap_or(refresh_token),
            access_token,
            expires_at: Utc::now().timestamp() + token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
        };
        self.credential = Some(credential);
        self.changed = true;
        Ok(())
    }

    /// Whether the access token has to be refreshed before use at `now`.
    pub fn needs_refresh(&self, now: i64) -> bool {
        match &self.credential {
            Some(c) => c.access_token.is_empty() || c.expires_at - now <= REFRESH_MARGIN_SECS,
            None => true,
        }
    }

    /// Returns a valid access token, refreshing it first if it is stale.
    pub async fn access_token(&mut self) -> Result<String> {
        if self.needs_refresh(Utc::now().timestamp()) {
            self.refresh_access_credential().await?;
        }
        self.credential
            .as_ref()
            .map(|c| c.access_token.clone())
            .ok_or_else(|| Error::Auth("no credential available".to_string()))
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let response = self
            .http
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Error::Auth(format!(
                "token endpoint answered {}: {}",
                status.as_u16(),
                super::server_message(&body)
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Auth(format!("malformed token response: {}", e)))
    }
}
