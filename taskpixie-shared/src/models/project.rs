/// Project model and payload
///
/// A project has one owner and an ordered set of members. Members are stored in
/// `project_members` with a `position` column so the order given in the payload
/// is the order returned.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     title VARCHAR(100) NOT NULL,
///     detail TEXT NOT NULL,
///     priority priority_level NOT NULL,
///     status work_status NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_members (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     position INTEGER NOT NULL,
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;
use super::workflow::{Priority, Status};

/// Full project view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub detail: String,
    pub priority: Priority,
    pub status: Status,
    pub owner_id: Uuid,

    /// Owner's username, joined for display
    pub owner_username: String,

    /// Members in insertion order, loaded separately from `project_members`
    #[sqlx(skip)]
    pub members: Vec<UserSummary>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight entry in project listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PreviewProject {
    pub id: Uuid,
    pub title: String,
}

/// Create and update input (update is a full replace)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProjectPayload {
    #[validate(length(min = 3, max = 100, message = "Title must be 3-100 characters"))]
    pub title: String,

    #[validate(length(min = 3, max = 1000, message = "Detail must be 3-1000 characters"))]
    pub detail: String,

    pub priority: Priority,

    pub status: Status,

    /// Member user IDs; duplicates collapse to the first occurrence
    #[serde(default)]
    pub members_id: Vec<Uuid>,
}
