/// Domain models for Task Pixie
///
/// Entities, preview shapes and the input payloads validated by the use cases.
///
/// # Models
///
/// - `user`: accounts, credentials and the `{id, username}` summary
/// - `project`: projects with ordered members
/// - `task`: tasks with optional project and assignees
/// - `workflow`: `Priority` and `Status` enumerations

pub mod project;
pub mod task;
pub mod user;
pub mod workflow;

pub use project::{PreviewProject, Project, ProjectPayload};
pub use task::{PreviewTask, Task, TaskPayload};
pub use user::{
    LoginUserPayload, NewUser, RegisterUserPayload, UpdateUserPayload, User, UserChanges,
    UserCredentials, UserSummary,
};
pub use workflow::{Priority, Status};
