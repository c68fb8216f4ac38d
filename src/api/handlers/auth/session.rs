//! Session endpoints: refresh rotation, logout, profile.
//!
//! The refresh endpoint authenticates with two artifacts: the bearer access
//! token names the account (signature checked, expiry deliberately not, since
//! an expired session is the normal reason to be here) and the `refreshToken`
//! cookie proves possession of the current refresh token.

use axum::{
    Json,
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{AUTHORIZATION, COOKIE, InvalidHeaderValue, SET_COOKIE},
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::types::MessageResponse;
use crate::account::Account;
use crate::api::AppState;
use crate::error::AuthError;
use crate::token::TokenPair;

pub(crate) const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Scope the cookie to the one endpoint that reads it. `SameSite=None` +
/// `Secure` because the frontend lives on another origin.
pub(crate) fn refresh_cookie(
    token: &str,
    max_age_seconds: u64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{REFRESH_COOKIE_NAME}={token}; Path=/api/refresh-token; HttpOnly; Secure; SameSite=None; Max-Age={max_age_seconds}"
    ))
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::Unauthenticated)
}

fn extract_refresh_cookie(headers: &HeaderMap) -> Result<String, AuthError> {
    headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').map(str::trim).find_map(|cookie| {
                cookie
                    .strip_prefix(REFRESH_COOKIE_NAME)
                    .and_then(|rest| rest.strip_prefix('='))
            })
        })
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or(AuthError::Unauthenticated)
}

/// Resolve the bearer access token to an account id, enforcing expiry.
pub(crate) fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Uuid, AuthError> {
    let token = extract_bearer_token(headers)?;
    state.service.issuer().verify_access(token)
}

/// Attach the token pair body plus its refresh cookie to a 200 response.
pub(crate) fn token_response(state: &AppState, pair: TokenPair) -> axum::response::Response {
    let max_age = state.service.issuer().refresh_ttl().as_secs();
    match refresh_cookie(&pair.refresh_token, max_age) {
        Ok(cookie) => {
            let mut headers = HeaderMap::new();
            headers.insert(SET_COOKIE, cookie);
            (StatusCode::OK, headers, Json(pair)).into_response()
        }
        Err(err) => {
            error!("Failed to build refresh cookie: {err}");
            AuthError::Internal(anyhow::anyhow!("cookie encoding failed")).into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/refresh-token",
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Refresh token missing, stale, or access token invalid", body = String)
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let result = async {
        let access_token = extract_bearer_token(&headers)?;
        let refresh_token = extract_refresh_cookie(&headers)?;
        state.service.refresh(access_token, &refresh_token).await
    }
    .await;
    match result {
        Ok(pair) => token_response(&state, pair),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/logout",
    responses(
        (status = 200, description = "Session revoked", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = String)
    ),
    tag = "auth"
)]
pub async fn logout(headers: HeaderMap, state: Extension<Arc<AppState>>) -> impl IntoResponse {
    let result = async {
        let account_id = authenticate(&state, &headers)?;
        state.service.logout(account_id).await
    }
    .await;
    match result {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("Logged out"))).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Authenticated account", body = Account),
        (status = 401, description = "Missing or invalid access token", body = String),
        (status = 404, description = "Account no longer exists", body = String)
    ),
    tag = "auth"
)]
pub async fn profile(headers: HeaderMap, state: Extension<Arc<AppState>>) -> impl IntoResponse {
    let result = async {
        let account_id = authenticate(&state, &headers)?;
        state.service.profile(account_id).await
    }
    .await;
    match result {
        Ok(account) => (StatusCode::OK, Json(account)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn refresh_cookie_shape() -> Result<()> {
        let cookie = refresh_cookie("tok-123", 2_592_000)?;
        assert_eq!(
            cookie.to_str()?,
            "refreshToken=tok-123; Path=/api/refresh-token; HttpOnly; Secure; SameSite=None; Max-Age=2592000"
        );
        Ok(())
    }

    #[test]
    fn bearer_extraction_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_err());
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&headers).is_err());
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_err());
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(extract_bearer_token(&headers).ok(), Some("tok"));
    }

    #[test]
    fn refresh_cookie_is_found_among_others() -> Result<()> {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=tok-123; lang=en"),
        );
        assert_eq!(
            extract_refresh_cookie(&headers).map_err(|e| anyhow::anyhow!(e.to_string()))?,
            "tok-123"
        );
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert!(extract_refresh_cookie(&headers).is_err());
        Ok(())
    }
}
