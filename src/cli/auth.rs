use std::time::Duration;

use crate::{
    Res,
    config::{self, SpotifyConfig},
    management::TokenManager,
    spotify::{
        SpotifyClient,
        auth::{CallbackCodePrompt, StdinCodePrompt},
    },
    success,
};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs the authorization-code flow and stores the credential.
///
/// With `callback` a local server on `SERVER_ADDRESS` catches the redirect,
/// otherwise the code is pasted on stdin.
pub async fn auth(callback: bool) -> Res<()> {
    let config = SpotifyConfig::from_env()?;
    let mut client = SpotifyClient::new(config)?;

    if callback {
        let mut prompt = CallbackCodePrompt {
            addr: config::server_addr(),
            timeout: CALLBACK_TIMEOUT,
        };
        client.auth_mut().acquire_refresh_credential(&mut prompt).await?;
    } else {
        let mut prompt = StdinCodePrompt { open_browser: true };
        client.auth_mut().acquire_refresh_credential(&mut prompt).await?;
    }

    super::save_credential(&mut client).await?;
    let user_id = client.get_user_id().await?;
    super::save_credential(&mut client).await?;

    success!(
        "Authentication successful! Signed in as {}, credential stored in {}",
        user_id,
        TokenManager::default_location().path().display()
    );
    Ok(())
}
