//! # API Module
//!
//! HTTP endpoints of the short-lived local server that catches Spotify's
//! OAuth redirect during `spotreview auth --callback`.
//!
//! - [`callback`] - stores the authorization code (or the error) Spotify
//!   redirects with, for the authorization flow waiting on it.
//! - [`health`] - reports that the server is up, handy when checking that the
//!   redirect URI points at the right port.

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
