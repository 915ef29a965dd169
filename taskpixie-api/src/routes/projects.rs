/// Project endpoints (all JWT)
///
/// - `POST /v1/projects` - create; the caller becomes the owner
/// - `GET /v1/projects` - previews of owned projects, then member projects
/// - `GET /v1/projects/:id` - project with owner and members
/// - `PUT /v1/projects/:id` - replace fields and members (owner only)
/// - `DELETE /v1/projects/:id` - delete and detach its tasks (owner only)
/// - `GET /v1/projects/:id/members`
/// - `GET /v1/projects/:id/tasks`

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use taskpixie_shared::{
    auth::AuthContext,
    models::{PreviewProject, PreviewTask, Project, ProjectPayload, UserSummary},
};
use uuid::Uuid;

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ProjectPayload>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = state.projects.add_project(auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<PreviewProject>>> {
    Ok(Json(state.projects.get_projects(auth.user_id).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    Ok(Json(state.projects.get_project(id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjectPayload>,
) -> ApiResult<Json<Project>> {
    Ok(Json(
        state.projects.update_project(auth.user_id, id, payload).await?,
    ))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.projects.delete_project(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_project_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.projects.get_project_members(id).await?))
}

pub async fn get_project_tasks(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<PreviewTask>>> {
    Ok(Json(state.tasks.get_tasks_by_project(id).await?))
}
