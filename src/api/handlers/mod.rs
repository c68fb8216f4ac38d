//! Route handlers for the authentication API.

pub mod auth;
pub mod health;
pub mod oauth2;

use axum::{http::StatusCode, response::IntoResponse};

/// Undocumented `/` route: name and version only, no auth, no state.
pub async fn root() -> impl IntoResponse {
    (
        StatusCode::OK,
        concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
    )
}
