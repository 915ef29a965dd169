/// `GET /v1/avatars/:key` - serves a stored avatar image

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

pub async fn get_avatar(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let object = state.users.get_avatar(&key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, object.content_type),
            // Keys are never reused, so the content never changes
            (header::CACHE_CONTROL, "public, max-age=86400, immutable"),
        ],
        object.data,
    ))
}
