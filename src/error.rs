//! Typed error taxonomy shared across the auth core.
//!
//! Callers branch on the kind, never on message strings. Messages are the
//! opaque external surface: `Unauthenticated` and `NotFound` deliberately do
//! not reveal which part of a compound check failed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidInput(String),

    /// Bad credentials, bad/expired refresh token. Never distinguishes
    /// "no such email" from "wrong password".
    #[error("Invalid credentials")]
    Unauthenticated,

    #[error("Email already exists")]
    AlreadyExists,

    #[error("User already verified")]
    AlreadyVerified,

    /// Unknown account or unconfigured provider. Provider routes answer as
    /// if they do not exist rather than as a disabled feature.
    #[error("Page not found")]
    NotFound,

    /// Structural or signature failure on an access token.
    #[error("Invalid token")]
    InvalidToken,

    /// Signature was fine, TTL elapsed. Callers need this apart from
    /// `InvalidToken` for the re-login UX.
    #[error("Token expired")]
    TokenExpired,

    /// Callback `state` does not match any live authorization attempt.
    #[error("Corrupted state")]
    InvalidState,

    /// Email verification code mismatch.
    #[error("Invalid code")]
    InvalidCode,

    /// Provider token exchange or profile fetch failed; carries the
    /// provider's error body for the logs.
    #[error("Upstream authentication failed: {0}")]
    UpstreamAuth(String),

    #[error("Mail delivery failed")]
    Mail(#[source] anyhow::Error),

    #[error("Credential store unavailable")]
    Store(#[source] anyhow::Error),

    #[error("Identity repository unavailable")]
    Repository(#[source] anyhow::Error),

    #[error("Internal error")]
    Internal(#[source] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthenticated
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::InvalidState
            | Self::InvalidCode => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists | Self::AlreadyVerified => StatusCode::CONFLICT,
            Self::UpstreamAuth(_) | Self::Mail(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) | Self::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to clients. Upstream bodies and internal sources
    /// stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::UpstreamAuth(_) => "Upstream authentication failed".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // 4xx outcomes are normal traffic; only failures we own or depend on
        // get logged here, with the source chain the client never sees.
        if self.status().is_server_error() {
            error!("{self:?}");
        }
        (self.status(), self.public_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_family_maps_to_401() {
        for err in [
            AuthError::Unauthenticated,
            AuthError::InvalidToken,
            AuthError::TokenExpired,
            AuthError::InvalidState,
            AuthError::InvalidCode,
        ] {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn conflict_family_maps_to_409() {
        assert_eq!(AuthError::AlreadyExists.status(), StatusCode::CONFLICT);
        assert_eq!(AuthError::AlreadyVerified.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn upstream_body_never_reaches_public_message() {
        let err = AuthError::UpstreamAuth("{\"error\":\"bad_verification_code\"}".to_string());
        assert_eq!(err.public_message(), "Upstream authentication failed");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_found_message_is_opaque() {
        assert_eq!(AuthError::NotFound.public_message(), "Page not found");
    }
}
