/// API route handlers, one module per resource
///
/// - `health`: health check
/// - `users`: registration, search, profiles
/// - `auth`: login, refresh, me, logout
/// - `projects`: projects, members, project tasks
/// - `tasks`: tasks and assignees
/// - `avatars`: avatar objects

pub mod auth;
pub mod avatars;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;
