/// User endpoints
///
/// - `POST /v1/users`: register
/// - `GET /v1/users/search?username=`: up to five username matches
/// - `GET /v1/users/:id`: public profile
/// - `PUT /v1/users/:id`: replace own profile (multipart, JWT)
///
/// # Profile update form
///
/// | Part | Required |
/// |---|---|
/// | `username` | yes |
/// | `email` | yes |
/// | `password` | no, empty keeps the current one |
/// | `avatar` | no, PNG/JPEG/WebP up to 2 MiB |

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskpixie_shared::{
    auth::AuthContext,
    models::{RegisterUserPayload, UpdateUserPayload, User, UserSummary},
};
use uuid::Uuid;

/// Public view of a user; the avatar key becomes a fetchable path
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar_url: user.avatar_link.map(|key| format!("/v1/avatars/{}", key)),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub username: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserPayload>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let user = state.users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.users.search_users(&query.username).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    Ok(Json(state.users.get_user_by_id(id).await?.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<Json<UserResponse>> {
    let (payload, avatar) = read_profile_form(multipart).await?;
    let user = state.users.update_user(&auth, id, payload, avatar).await?;
    Ok(Json(user.into()))
}

async fn read_profile_form(
    mut multipart: Multipart,
) -> ApiResult<(UpdateUserPayload, Option<Bytes>)> {
    let mut payload = UpdateUserPayload::default();
    let mut avatar = None;

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "username" => payload.username = field.text().await?.trim().to_string(),
            "email" => payload.email = field.text().await?.trim().to_string(),
            "password" => {
                let password = field.text().await?;
                payload.password = (!password.is_empty()).then_some(password);
            }
            "avatar" => {
                let data = field.bytes().await?;
                // Browsers send an empty part when no file was picked
                if !data.is_empty() {
                    avatar = Some(data);
                }
            }
            other => {
                return Err(ApiError::BadRequest(format!("Unexpected form field '{}'", other)));
            }
        }
    }

    Ok((payload, avatar))
}
