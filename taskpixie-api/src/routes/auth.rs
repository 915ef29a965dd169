/// Authentication endpoints
///
/// - `POST /v1/auth/login` - exchange email/username + password for tokens
/// - `POST /v1/auth/refresh` - new access token from a live refresh token
/// - `GET /v1/auth/me` - current user (JWT)
/// - `POST /v1/auth/logout` - revoke the access token and, optionally, the
///   refresh session (JWT)

use crate::{app::AppState, error::ApiResult, routes::users::UserResponse};
use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::{Deserialize, Serialize};
use taskpixie_shared::{
    auth::{AuthContext, IssuedToken},
    models::LoginUserPayload,
};

const TOKEN_TYPE: &str = "Bearer";

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,

    pub refresh_token: String,

    pub token_type: String,

    /// Seconds until the access token expires
    pub expires_in: i64,

    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,

    pub token_type: String,

    pub expires_in: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

fn expires_in(token: &IssuedToken) -> i64 {
    token
        .claims
        .time_until_expiration()
        .map(|d| d.num_seconds())
        .unwrap_or(0)
}

/// Login
///
/// ```text
/// POST /v1/auth/login
///
/// { "identity": "pixie@example.com", "password": "correct horse" }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: unknown identity or wrong password (same message)
/// - `422 Unprocessable Entity`: empty fields
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginUserPayload>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state.users.login(payload).await?;

    Ok(Json(LoginResponse {
        expires_in: expires_in(&session.access),
        access_token: session.access.token,
        refresh_token: session.refresh.token,
        token_type: TOKEN_TYPE.to_string(),
        user: session.user.into(),
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<RefreshResponse>> {
    let access = state.users.refresh(&req.refresh_token).await?;

    Ok(Json(RefreshResponse {
        expires_in: expires_in(&access),
        access_token: access.token,
        token_type: TOKEN_TYPE.to_string(),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(state.users.get_user_by_id(auth.user_id).await?.into()))
}

/// Logout; the body is optional
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    body: Option<Json<LogoutRequest>>,
) -> ApiResult<StatusCode> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    state
        .users
        .logout(&auth, req.refresh_token.as_deref())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
