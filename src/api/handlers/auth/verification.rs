//! Email verification endpoints.
//!
//! Both are authenticated: the bearer token names the account, so the
//! endpoints carry no email in the payload and cannot be used for probing.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use super::session::authenticate;
use super::types::{ConfirmEmailRequest, MessageResponse};
use crate::api::AppState;
use crate::error::AuthError;

#[utoipa::path(
    put,
    path = "/api/verify-email",
    responses(
        (status = 200, description = "Verification email sent", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = String),
        (status = 409, description = "Account already verified", body = String)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let result = async {
        let account_id = authenticate(&state, &headers)?;
        state.service.verify_email(account_id).await
    }
    .await;
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Verification email sent")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/confirm-email",
    request_body = ConfirmEmailRequest,
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 401, description = "Wrong code or invalid access token", body = String)
    ),
    tag = "auth"
)]
pub async fn confirm_email(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ConfirmEmailRequest>>,
) -> impl IntoResponse {
    let result = async {
        let account_id = authenticate(&state, &headers)?;
        let Some(Json(request)) = payload else {
            return Err(AuthError::InvalidInput("Missing payload".to_string()));
        };
        state.service.confirm_email(account_id, &request.code).await
    }
    .await;
    match result {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("Email verified"))).into_response(),
        Err(err) => err.into_response(),
    }
}
