use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::{PreviewProject, Project, ProjectPayload, UserSummary};
use crate::preview::visible_items;
use crate::repository::ProjectRepository;
use crate::validation::{dedup_ids, validate_payload};

pub struct ProjectUseCase {
    projects: Arc<dyn ProjectRepository>,
}

impl ProjectUseCase {
    pub fn new(projects: Arc<dyn ProjectRepository>) -> Self {
        Self { projects }
    }

    pub async fn add_project(&self, owner_id: Uuid, mut payload: ProjectPayload) -> DomainResult<Project> {
        validate_payload(&payload)?;
        payload.members_id = dedup_ids(&payload.members_id);

        let id = self.projects.add_project(owner_id, &payload).await?;
        info!(project_id = %id, owner_id = %owner_id, "Project created");

        self.projects.get_project_by_id(id).await
    }

    pub async fn get_project(&self, id: Uuid) -> DomainResult<Project> {
        self.projects.get_project_by_id(id).await
    }

    pub async fn get_project_members(&self, id: Uuid) -> DomainResult<Vec<UserSummary>> {
        self.projects.get_project_members(id).await
    }

    /// Full replace of fields and members; owner only
    pub async fn update_project(
        &self,
        user_id: Uuid,
        id: Uuid,
        mut payload: ProjectPayload,
    ) -> DomainResult<Project> {
        validate_payload(&payload)?;
        self.ensure_owner(user_id, id).await?;
        payload.members_id = dedup_ids(&payload.members_id);

        self.projects.update_project_by_id(id, &payload).await?;
        info!(project_id = %id, "Project updated");

        self.projects.get_project_by_id(id).await
    }

    /// Owner only; the project's tasks are kept and detached
    pub async fn delete_project(&self, user_id: Uuid, id: Uuid) -> DomainResult<()> {
        self.ensure_owner(user_id, id).await?;
        self.projects.delete_project_by_id(id).await?;
        info!(project_id = %id, "Project deleted");
        Ok(())
    }

    /// Projects the user owns followed by those they are a member of
    pub async fn get_projects(&self, user_id: Uuid) -> DomainResult<Vec<PreviewProject>> {
        visible_items(
            self.projects.get_projects_by_owner(user_id),
            self.projects.get_projects_by_member(user_id),
        )
        .await
    }

    async fn ensure_owner(&self, user_id: Uuid, id: Uuid) -> DomainResult<()> {
        if self.projects.get_project_owner(id).await? != user_id {
            return Err(DomainError::Forbidden(
                "Only the project owner can modify this project".to_string(),
            ));
        }
        Ok(())
    }
}
