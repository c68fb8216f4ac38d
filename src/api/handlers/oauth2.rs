//! Federated sign-in endpoints.
//!
//! The provider name is a path segment; unknown or unconfigured providers
//! answer 404 so the route is indistinguishable from one that does not exist.

use axum::{
    extract::{Extension, Path, Query},
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use utoipa::IntoParams;

use super::auth::session::refresh_cookie;
use crate::api::AppState;
use crate::error::AuthError;
use crate::oauth2::ProviderKind;

#[derive(Deserialize, IntoParams, Debug)]
pub struct CallbackQuery {
    pub code: String,
    pub state: String,
}

fn parse_provider(provider: &str) -> Result<ProviderKind, AuthError> {
    provider.parse().map_err(|()| AuthError::NotFound)
}

#[utoipa::path(
    get,
    path = "/api/auth/ext/{provider}",
    params(("provider" = String, Path, description = "Identity provider name")),
    responses(
        (status = 307, description = "Redirect to the provider's authorize URL"),
        (status = 404, description = "Unknown or unconfigured provider", body = String)
    ),
    tag = "oauth2"
)]
pub async fn start(
    Path(provider): Path<String>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let result = async {
        let kind = parse_provider(&provider)?;
        state.federation.start(kind).await
    }
    .await;
    match result {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/auth/ext/{provider}/callback",
    params(
        ("provider" = String, Path, description = "Identity provider name"),
        CallbackQuery
    ),
    responses(
        (status = 308, description = "Redirect to the frontend with an access token"),
        (status = 401, description = "State unknown, expired, or already used", body = String),
        (status = 404, description = "Unknown or unconfigured provider", body = String),
        (status = 502, description = "Provider rejected the exchange", body = String)
    ),
    tag = "oauth2"
)]
pub async fn callback(
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let result = async {
        let kind = parse_provider(&provider)?;
        let profile = state
            .federation
            .handle_callback(kind, &query.code, &query.state)
            .await?;
        let account = state.linker.find_or_create(kind, &profile).await?;
        state.service.issuer().issue_pair(account.id).await
    }
    .await;
    match result {
        Ok(pair) => {
            let url = format!(
                "{}/?access_token={}",
                state.web_url.trim_end_matches('/'),
                pair.access_token
            );
            let max_age = state.service.issuer().refresh_ttl().as_secs();
            match refresh_cookie(&pair.refresh_token, max_age) {
                Ok(cookie) => {
                    let mut headers = HeaderMap::new();
                    headers.insert(SET_COOKIE, cookie);
                    (headers, Redirect::permanent(&url)).into_response()
                }
                Err(err) => {
                    error!("Failed to build refresh cookie: {err}");
                    AuthError::Internal(anyhow::anyhow!("cookie encoding failed")).into_response()
                }
            }
        }
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_answers_not_found() {
        assert!(matches!(
            parse_provider("twitter"),
            Err(AuthError::NotFound)
        ));
        assert!(matches!(parse_provider("Google"), Err(AuthError::NotFound)));
        assert_eq!(parse_provider("github").ok(), Some(ProviderKind::Github));
    }
}
