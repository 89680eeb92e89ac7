use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, response::Html};
use tokio::sync::Mutex;

use crate::types::AuthorizationState;

/// Receives Spotify's redirect and hands the authorization code to the
/// waiting authorization flow.
///
/// Spotify redirects with either `?code=...` or `?error=...` (for example
/// `access_denied` when the user declines). Both outcomes are stored in the
/// shared state; the token exchange itself happens in the authenticator.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<Arc<Mutex<AuthorizationState>>>,
) -> Html<&'static str> {
    let mut state = shared_state.lock().await;

    if let Some(code) = params.get("code") {
        state.code = Some(code.clone());
        return Html("<h2>Authentication successful.</h2><p>Close this browser window.</p>");
    }

    match params.get("error") {
        Some(err) => {
            state.error = Some(err.clone());
            Html("<h4>Login failed.</h4>")
        }
        None => Html("<h4>Missing authorization code.</h4>"),
    }
}
