//! Local-credential endpoints: registration, sign-in, password management.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;

use super::session::{authenticate, token_response};
use super::types::{
    ChangePasswordRequest, ForgotPasswordRequest, MessageResponse, SignInRequest, SignUpRequest,
};
use crate::account::Account;
use crate::api::AppState;
use crate::error::AuthError;
use crate::service::Registration;
use crate::token::TokenPair;

#[utoipa::path(
    post,
    path = "/api/sign-up",
    request_body = SignUpRequest,
    responses(
        (status = 201, description = "Account created", body = Account),
        (status = 400, description = "Invalid email or weak password", body = String),
        (status = 409, description = "Email already registered", body = String)
    ),
    tag = "auth"
)]
pub async fn sign_up(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<SignUpRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    let registration = Registration {
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        password: request.password,
    };
    match state.service.sign_up(registration).await {
        Ok(account) => (StatusCode::CREATED, Json(account)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/sign-in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Token pair; refresh token also set as a cookie", body = TokenPair),
        (status = 401, description = "Invalid credentials", body = String)
    ),
    tag = "auth"
)]
pub async fn sign_in(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<SignInRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    match state
        .service
        .sign_in(&request.email, &request.password)
        .await
    {
        Ok(pair) => token_response(&state, pair),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageResponse),
        (status = 404, description = "Unknown email", body = String)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };
    match state.service.forgot_password(&request.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Password reset email sent")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    put,
    path = "/api/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "New password rejected", body = String),
        (status = 401, description = "Current password wrong or token invalid", body = String)
    ),
    tag = "auth"
)]
pub async fn change_password(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ChangePasswordRequest>>,
) -> impl IntoResponse {
    let result = async {
        let account_id = authenticate(&state, &headers)?;
        let Some(Json(request)) = payload else {
            return Err(AuthError::InvalidInput("Missing payload".to_string()));
        };
        state
            .service
            .change_password(account_id, &request.current_password, &request.new_password)
            .await
    }
    .await;
    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Password changed")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
