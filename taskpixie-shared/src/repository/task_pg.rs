/// PostgreSQL adapter for [`TaskRepository`]
///
/// Task writes follow the same transaction sequence as projects, with
/// `task_assignments` as the association table. A `project_id` pointing at a
/// missing project fails the insert with SQLSTATE 23503, surfaced as
/// `NotFound`.
///
/// Preview queries LEFT JOIN `projects` so project-less tasks are listed with
/// `project_name = NULL`.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::TaskRepository;
use crate::error::{DomainError, DomainResult};
use crate::models::{PreviewTask, Task, TaskPayload, UserSummary};
use crate::validation::dedup_ids;

#[derive(Debug, Clone)]
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn get_task_assignees(&self, id: Uuid) -> DomainResult<Vec<UserSummary>> {
        let assignees = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username
            FROM task_assignments ta
            JOIN users u ON u.id = ta.user_id
            WHERE ta.task_id = $1
            ORDER BY ta.position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(assignees)
    }
}

fn task_not_found(id: Uuid) -> DomainError {
    DomainError::NotFound(format!("Task {} not found", id))
}

async fn insert_assignments(
    tx: &mut Transaction<'_, Postgres>,
    task_id: Uuid,
    assignees: &[Uuid],
) -> Result<(), sqlx::Error> {
    for (position, user_id) in dedup_ids(assignees).into_iter().enumerate() {
        sqlx::query(
            "INSERT INTO task_assignments (task_id, user_id, position) VALUES ($1, $2, $3)",
        )
        .bind(task_id)
        .bind(user_id)
        .bind(position as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

const PREVIEW_COLUMNS: &str = "t.id, t.title, t.description, t.priority, t.status, p.title AS project_name";

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn add_task(&self, owner_id: Uuid, payload: &TaskPayload) -> DomainResult<Uuid> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO tasks (id, title, description, detail, priority, status, project_id, owner_id, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.detail)
        .bind(payload.priority)
        .bind(payload.status)
        .bind(payload.project_id)
        .bind(owner_id)
        .bind(payload.due_date)
        .execute(&mut *tx)
        .await?;

        insert_assignments(&mut tx, id, &payload.assigned_to_id).await?;

        tx.commit().await?;

        debug!(task_id = %id, owner_id = %owner_id, assignees = payload.assigned_to_id.len(), "Task inserted");
        Ok(id)
    }

    async fn get_task_by_id(&self, id: Uuid) -> DomainResult<Task> {
        let mut task = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.title, t.description, t.detail, t.priority, t.status,
                   t.project_id, p.title AS project_title,
                   t.owner_id, u.username AS owner_username,
                   t.due_date, t.created_at, t.updated_at
            FROM tasks t
            JOIN users u ON u.id = t.owner_id
            LEFT JOIN projects p ON p.id = t.project_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| task_not_found(id))?;

        task.assignees = self.get_task_assignees(id).await?;
        Ok(task)
    }

    async fn update_task_by_id(&self, id: Uuid, payload: &TaskPayload) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, detail = $4, priority = $5, status = $6,
                project_id = $7, due_date = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.description)
        .bind(&payload.detail)
        .bind(payload.priority)
        .bind(payload.status)
        .bind(payload.project_id)
        .bind(payload.due_date)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| task_not_found(id))?;

        sqlx::query("DELETE FROM task_assignments WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_assignments(&mut tx, id, &payload.assigned_to_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_task_by_id(&self, id: Uuid) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM task_assignments WHERE task_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(task_not_found(id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_tasks_by_project(&self, project_id: Uuid) -> DomainResult<Vec<PreviewTask>> {
        let query = format!(
            "SELECT {PREVIEW_COLUMNS} FROM tasks t \
             LEFT JOIN projects p ON p.id = t.project_id \
             WHERE t.project_id = $1 \
             ORDER BY t.created_at, t.id"
        );
        let tasks = sqlx::query_as::<_, PreviewTask>(&query)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn get_tasks_by_owner(&self, user_id: Uuid) -> DomainResult<Vec<PreviewTask>> {
        let query = format!(
            "SELECT {PREVIEW_COLUMNS} FROM tasks t \
             LEFT JOIN projects p ON p.id = t.project_id \
             WHERE t.owner_id = $1 \
             ORDER BY t.created_at, t.id"
        );
        let tasks = sqlx::query_as::<_, PreviewTask>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn get_tasks_by_assigned_user(&self, user_id: Uuid) -> DomainResult<Vec<PreviewTask>> {
        let query = format!(
            "SELECT {PREVIEW_COLUMNS} FROM tasks t \
             JOIN task_assignments ta ON ta.task_id = t.id \
             LEFT JOIN projects p ON p.id = t.project_id \
             WHERE ta.user_id = $1 \
             ORDER BY t.created_at, t.id"
        );
        let tasks = sqlx::query_as::<_, PreviewTask>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    async fn get_task_owner(&self, id: Uuid) -> DomainResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| task_not_found(id))
    }
}
