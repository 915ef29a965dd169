/// Task model and payload
///
/// A task has one owner, an optional project and a set of assignees. Deleting
/// the project detaches the task instead of deleting it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     title VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL,
///     detail TEXT,
///     priority priority_level NOT NULL,
///     status work_status NOT NULL,
///     project_id UUID REFERENCES projects(id) ON DELETE SET NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     due_date DATE NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE task_assignments (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     position INTEGER NOT NULL,
///     PRIMARY KEY (task_id, user_id)
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;
use super::workflow::{Priority, Status};

/// Full task view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub detail: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub project_id: Option<Uuid>,

    /// Title of the linked project, if any
    pub project_title: Option<String>,

    pub owner_id: Uuid,
    pub owner_username: String,
    pub due_date: NaiveDate,

    /// Assignees in insertion order, loaded separately from `task_assignments`
    #[sqlx(skip)]
    pub assignees: Vec<UserSummary>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight entry in task listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PreviewTask {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,

    /// Title of the linked project; `None` for project-less tasks
    pub project_name: Option<String>,
}

/// Create and update input (update is a full replace)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskPayload {
    #[validate(length(min = 3, max = 100, message = "Title must be 3-100 characters"))]
    pub title: String,

    #[validate(length(min = 3, max = 1000, message = "Description must be 3-1000 characters"))]
    pub description: String,

    /// Optional; a blank string counts as absent
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(length(min = 3, max = 1000, message = "Detail must be 3-1000 characters"))]
    pub detail: Option<String>,

    pub priority: Priority,

    pub status: Status,

    pub project_id: Option<Uuid>,

    pub due_date: NaiveDate,

    /// Assignee user IDs; duplicates collapse to the first occurrence
    #[serde(default)]
    pub assigned_to_id: Vec<Uuid>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
