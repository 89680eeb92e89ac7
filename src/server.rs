use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::sync::Mutex;

use crate::{
    api,
    error::{Error, Result},
    types::AuthorizationState,
};

/// Serves the OAuth callback on `addr` until the task is aborted.
pub async fn start_api_server(addr: &str, state: Arc<Mutex<AuthorizationState>>) -> Result<()> {
    let app = Router::new()
        .route("/health", get(api::health))
        .route("/callback", get(api::callback).layer(Extension(state)));

    let addr = SocketAddr::from_str(addr)
        .map_err(|e| Error::Config(format!("Failed to parse server address {}: {}", addr, e)))?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::debug!(%addr, "callback server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
