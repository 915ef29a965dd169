/// Repository interfaces
///
/// Each trait has one PostgreSQL adapter in this module. Use cases hold the
/// traits as `Arc<dyn ...>` so tests can swap in in-memory implementations.
///
/// All methods return [`DomainResult`]; adapters translate `sqlx::Error`
/// through `From<sqlx::Error> for DomainError`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::{
    NewUser, PreviewProject, PreviewTask, Project, ProjectPayload, Task, TaskPayload, User,
    UserChanges, UserCredentials, UserSummary,
};

pub mod project_pg;
pub mod task_pg;
pub mod user_pg;

pub use project_pg::PgProjectRepository;
pub use task_pg::PgTaskRepository;
pub use user_pg::PgUserRepository;

/// Maximum rows returned by a username search
pub const USER_SEARCH_LIMIT: i64 = 5;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new account; duplicate username/email yields `Conflict`
    async fn add_user(&self, user: NewUser) -> DomainResult<User>;

    /// Looks up by email or username (case-insensitive), returning the hash
    async fn get_user_for_login(&self, identity: &str) -> DomainResult<UserCredentials>;

    async fn get_user_by_id(&self, id: Uuid) -> DomainResult<User>;

    /// Applies the changes and returns the avatar key that was stored before
    async fn update_user_by_id(&self, id: Uuid, changes: UserChanges) -> DomainResult<Option<String>>;

    /// Case-insensitive substring match, at most [`USER_SEARCH_LIMIT`] rows
    async fn search_users_by_username(&self, username: &str) -> DomainResult<Vec<UserSummary>>;
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Inserts the project and its members in one transaction
    async fn add_project(&self, owner_id: Uuid, payload: &ProjectPayload) -> DomainResult<Uuid>;

    async fn get_project_by_id(&self, id: Uuid) -> DomainResult<Project>;

    async fn get_project_members(&self, id: Uuid) -> DomainResult<Vec<UserSummary>>;

    /// Replaces the project row and its member set in one transaction
    async fn update_project_by_id(&self, id: Uuid, payload: &ProjectPayload) -> DomainResult<()>;

    async fn delete_project_by_id(&self, id: Uuid) -> DomainResult<()>;

    async fn get_projects_by_owner(&self, user_id: Uuid) -> DomainResult<Vec<PreviewProject>>;

    async fn get_projects_by_member(&self, user_id: Uuid) -> DomainResult<Vec<PreviewProject>>;

    async fn get_project_owner(&self, id: Uuid) -> DomainResult<Uuid>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts the task and its assignments in one transaction
    async fn add_task(&self, owner_id: Uuid, payload: &TaskPayload) -> DomainResult<Uuid>;

    async fn get_task_by_id(&self, id: Uuid) -> DomainResult<Task>;

    /// Replaces the task row and its assignee set in one transaction
    async fn update_task_by_id(&self, id: Uuid, payload: &TaskPayload) -> DomainResult<()>;

    async fn delete_task_by_id(&self, id: Uuid) -> DomainResult<()>;

    async fn get_tasks_by_project(&self, project_id: Uuid) -> DomainResult<Vec<PreviewTask>>;

    async fn get_tasks_by_owner(&self, user_id: Uuid) -> DomainResult<Vec<PreviewTask>>;

    async fn get_tasks_by_assigned_user(&self, user_id: Uuid) -> DomainResult<Vec<PreviewTask>>;

    async fn get_task_owner(&self, id: Uuid) -> DomainResult<Uuid>;
}
