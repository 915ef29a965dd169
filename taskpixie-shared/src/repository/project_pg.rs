/// PostgreSQL adapter for [`ProjectRepository`]
///
/// Writes touching `projects` and `project_members` run in one transaction:
///
/// 1. insert or update the `projects` row
/// 2. on update or delete, drop the existing `project_members` rows
/// 3. insert one `project_members` row per member, keeping payload order
///
/// Any failure rolls the whole write back when the transaction is dropped.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::ProjectRepository;
use crate::error::{DomainError, DomainResult};
use crate::models::{PreviewProject, Project, ProjectPayload, UserSummary};
use crate::validation::dedup_ids;

#[derive(Debug, Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn project_not_found(id: Uuid) -> DomainError {
    DomainError::NotFound(format!("Project {} not found", id))
}

async fn insert_members(
    tx: &mut Transaction<'_, Postgres>,
    project_id: Uuid,
    members: &[Uuid],
) -> Result<(), sqlx::Error> {
    for (position, user_id) in dedup_ids(members).into_iter().enumerate() {
        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, position) VALUES ($1, $2, $3)",
        )
        .bind(project_id)
        .bind(user_id)
        .bind(position as i32)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn add_project(&self, owner_id: Uuid, payload: &ProjectPayload) -> DomainResult<Uuid> {
        let id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO projects (id, title, detail, priority, status, owner_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.detail)
        .bind(payload.priority)
        .bind(payload.status)
        .bind(owner_id)
        .execute(&mut *tx)
        .await?;

        insert_members(&mut tx, id, &payload.members_id).await?;

        tx.commit().await?;

        debug!(project_id = %id, owner_id = %owner_id, members = payload.members_id.len(), "Project inserted");
        Ok(id)
    }

    async fn get_project_by_id(&self, id: Uuid) -> DomainResult<Project> {
        let mut project = sqlx::query_as::<_, Project>(
            r#"
            SELECT p.id, p.title, p.detail, p.priority, p.status, p.owner_id,
                   u.username AS owner_username, p.created_at, p.updated_at
            FROM projects p
            JOIN users u ON u.id = p.owner_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| project_not_found(id))?;

        project.members = self.get_project_members(id).await?;
        Ok(project)
    }

    async fn get_project_members(&self, id: Uuid) -> DomainResult<Vec<UserSummary>> {
        let members = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username
            FROM project_members pm
            JOIN users u ON u.id = pm.user_id
            WHERE pm.project_id = $1
            ORDER BY pm.position
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        if members.is_empty() {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(project_not_found(id));
            }
        }

        Ok(members)
    }

    async fn update_project_by_id(&self, id: Uuid, payload: &ProjectPayload) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE projects
            SET title = $2, detail = $3, priority = $4, status = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.detail)
        .bind(payload.priority)
        .bind(payload.status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| project_not_found(id))?;

        sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        insert_members(&mut tx, id, &payload.members_id).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_project_by_id(&self, id: Uuid) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM project_members WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE tasks SET project_id = NULL, updated_at = NOW() WHERE project_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(project_not_found(id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_projects_by_owner(&self, user_id: Uuid) -> DomainResult<Vec<PreviewProject>> {
        let projects = sqlx::query_as::<_, PreviewProject>(
            r#"
            SELECT id, title
            FROM projects
            WHERE owner_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn get_projects_by_member(&self, user_id: Uuid) -> DomainResult<Vec<PreviewProject>> {
        let projects = sqlx::query_as::<_, PreviewProject>(
            r#"
            SELECT p.id, p.title
            FROM projects p
            JOIN project_members pm ON pm.project_id = p.id
            WHERE pm.user_id = $1
            ORDER BY p.created_at, p.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    async fn get_project_owner(&self, id: Uuid) -> DomainResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>("SELECT owner_id FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| project_not_found(id))
    }
}
