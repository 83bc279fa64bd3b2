use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    auth::OtpChallenge,
    error::Result,
};

use super::users::UserDto;

#[derive(Debug, Deserialize)]
pub struct RequestOtpDto {
    pub phone: String,
}

pub async fn request_otp(
    State(state): State<AppState>,
    Json(dto): Json<RequestOtpDto>,
) -> Result<Json<OtpChallenge>> {
    let challenge = state
        .service_context
        .auth_service
        .request_otp(&dto.phone)
        .await?;

    Ok(Json(challenge))
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpDto {
    pub phone: String,
    pub code: String,
    /// Display name for accounts created on first login.
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserDto,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(dto): Json<VerifyOtpDto>,
) -> Result<Json<TokenResponse>> {
    let (user, token) = state
        .service_context
        .auth_service
        .verify_otp(&dto.phone, &dto.code, dto.name)
        .await?;

    Ok(Json(TokenResponse {
        token,
        user: user.into(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct LoginDto {
    pub phone: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(dto): Json<LoginDto>,
) -> Result<Json<TokenResponse>> {
    let (user, token) = state
        .service_context
        .auth_service
        .login(&dto.phone, &dto.password)
        .await?;

    Ok(Json(TokenResponse {
        token,
        user: user.into(),
    }))
}

/// Re-issues a token for the already-authenticated caller, restarting the
/// expiry clock. The middleware has re-checked the account against the
/// database, so a deleted user cannot refresh.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<TokenResponse>> {
    let token = state
        .service_context
        .auth_service
        .issue_token(&current.user)?;

    Ok(Json(TokenResponse {
        token,
        user: current.user.into(),
    }))
}

pub async fn me(Extension(current): Extension<CurrentUser>) -> Result<Json<UserDto>> {
    Ok(Json(current.user.into()))
}
