/// Task endpoints (all JWT)
///
/// `GET /v1/tasks` lists the caller's own tasks first, then tasks assigned to
/// them, each task once. Only the owner may update or delete a task.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskpixie_shared::{
    auth::AuthContext,
    models::{PreviewTask, Task, TaskPayload},
};
use uuid::Uuid;

pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<TaskPayload>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = state.tasks.add_task(auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PreviewTask>>> {
    Ok(Json(state.tasks.get_tasks(auth.user_id).await?))
}

pub async fn get_task(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.get_task(id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TaskPayload>,
) -> ApiResult<Json<Task>> {
    Ok(Json(state.tasks.update_task(auth.user_id, id, payload).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.tasks.delete_task(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
