use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::models::{PreviewTask, Task, TaskPayload};
use crate::preview::visible_items;
use crate::repository::{ProjectRepository, TaskRepository};
use crate::validation::{dedup_ids, validate_payload};

pub struct TaskUseCase {
    tasks: Arc<dyn TaskRepository>,
    projects: Arc<dyn ProjectRepository>,
}

impl TaskUseCase {
    pub fn new(tasks: Arc<dyn TaskRepository>, projects: Arc<dyn ProjectRepository>) -> Self {
        Self { tasks, projects }
    }

    pub async fn add_task(&self, owner_id: Uuid, mut payload: TaskPayload) -> DomainResult<Task> {
        validate_payload(&payload)?;
        payload.assigned_to_id = dedup_ids(&payload.assigned_to_id);

        let id = self.tasks.add_task(owner_id, &payload).await?;
        info!(task_id = %id, owner_id = %owner_id, project_id = ?payload.project_id, "Task created");

        self.tasks.get_task_by_id(id).await
    }

    pub async fn get_task(&self, id: Uuid) -> DomainResult<Task> {
        self.tasks.get_task_by_id(id).await
    }

    /// Tasks linked to a project; `NotFound` when the project does not exist
    pub async fn get_tasks_by_project(&self, project_id: Uuid) -> DomainResult<Vec<PreviewTask>> {
        self.projects.get_project_owner(project_id).await?;
        self.tasks.get_tasks_by_project(project_id).await
    }

    /// Full replace of fields and assignees; owner only
    pub async fn update_task(&self, user_id: Uuid, id: Uuid, mut payload: TaskPayload) -> DomainResult<Task> {
        validate_payload(&payload)?;
        self.ensure_owner(user_id, id).await?;
        payload.assigned_to_id = dedup_ids(&payload.assigned_to_id);

        self.tasks.update_task_by_id(id, &payload).await?;
        info!(task_id = %id, "Task updated");

        self.tasks.get_task_by_id(id).await
    }

    pub async fn delete_task(&self, user_id: Uuid, id: Uuid) -> DomainResult<()> {
        self.ensure_owner(user_id, id).await?;
        self.tasks.delete_task_by_id(id).await?;
        info!(task_id = %id, "Task deleted");
        Ok(())
    }

    /// Tasks the user owns followed by those assigned to them
    pub async fn get_tasks(&self, user_id: Uuid) -> DomainResult<Vec<PreviewTask>> {
        visible_items(
            self.tasks.get_tasks_by_owner(user_id),
            self.tasks.get_tasks_by_assigned_user(user_id),
        )
        .await
    }

    async fn ensure_owner(&self, user_id: Uuid, id: Uuid) -> DomainResult<()> {
        if self.tasks.get_task_owner(id).await? != user_id {
            return Err(DomainError::Forbidden(
                "Only the task owner can modify this task".to_string(),
            ));
        }
        Ok(())
    }
}
