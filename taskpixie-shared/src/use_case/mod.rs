/// Application use cases
///
/// Each use case validates its input before calling a repository, enforces
/// ownership on writes, and returns [`crate::error::DomainError`] on failure.
///
/// - [`user::UserUseCase`]: registration, login sessions, profiles, search
/// - [`project::ProjectUseCase`]: projects, members, visible project previews
/// - [`task::TaskUseCase`]: tasks, assignees, visible task previews

pub mod project;
pub mod task;
pub mod user;

pub use project::ProjectUseCase;
pub use task::TaskUseCase;
pub use user::{LoginSession, UserUseCase};
