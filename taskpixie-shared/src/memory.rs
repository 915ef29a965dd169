/// In-memory adapters
///
/// [`InMemoryStore`] implements all three repository traits over one shared
/// state and mirrors the PostgreSQL schema's rules: case-insensitive unique
/// usernames and emails, foreign keys on members, assignees and task projects,
/// and project deletion detaching tasks. [`InMemoryCache`] and
/// [`InMemoryFileStore`] stand in for Redis and the avatar directory.
///
/// Used by the unit tests here and by the API's router tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use crate::cache::Cache;
use crate::error::{DomainError, DomainResult};
use crate::models::{
    NewUser, PreviewProject, PreviewTask, Project, ProjectPayload, Task, TaskPayload, User,
    UserChanges, UserCredentials, UserSummary,
};
use crate::repository::{ProjectRepository, TaskRepository, UserRepository, USER_SEARCH_LIMIT};
use crate::storage::{validate_avatar, validate_key, FileStore, StoredObject};
use crate::validation::dedup_ids;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct State {
    users: Vec<UserCredentials>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    unavailable: bool,
}

impl State {
    fn check_available(&self) -> DomainResult<()> {
        if self.unavailable {
            Err(DomainError::Storage("Datastore unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().map(|c| &c.user).find(|u| u.id == id)
    }

    fn summaries(&self, ids: &[Uuid]) -> DomainResult<Vec<UserSummary>> {
        dedup_ids(ids)
            .into_iter()
            .map(|id| {
                self.user(id)
                    .map(UserSummary::from)
                    .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))
            })
            .collect()
    }

    fn check_unique(&self, except: Option<Uuid>, username: &str, email: &str) -> DomainResult<()> {
        let taken = self.users.iter().any(|c| {
            Some(c.user.id) != except
                && (c.user.username.eq_ignore_ascii_case(username)
                    || c.user.email.eq_ignore_ascii_case(email))
        });
        if taken {
            Err(DomainError::Conflict("Username or email already exists".to_string()))
        } else {
            Ok(())
        }
    }

    fn project_title(&self, id: Option<Uuid>) -> DomainResult<Option<String>> {
        match id {
            None => Ok(None),
            Some(id) => self
                .projects
                .iter()
                .find(|p| p.id == id)
                .map(|p| Some(p.title.clone()))
                .ok_or_else(|| DomainError::NotFound(format!("Project {} not found", id))),
        }
    }

    fn task_preview(&self, task: &Task) -> PreviewTask {
        PreviewTask {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            status: task.status,
            project_name: task
                .project_id
                .and_then(|id| self.projects.iter().find(|p| p.id == id))
                .map(|p| p.title.clone()),
        }
    }
}

/// Repositories backed by process memory
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call fail with `Storage` until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        lock(&self.state).unavailable = unavailable;
    }

    fn state(&self) -> DomainResult<MutexGuard<'_, State>> {
        let state = lock(&self.state);
        state.check_available()?;
        Ok(state)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn add_user(&self, user: NewUser) -> DomainResult<User> {
        let mut state = self.state()?;
        state.check_unique(None, &user.username, &user.email)?;

        let now = Utc::now();
        let created = User {
            id: user.id,
            username: user.username,
            email: user.email,
            avatar_link: None,
            created_at: now,
            updated_at: now,
        };
        state.users.push(UserCredentials {
            user: created.clone(),
            password_hash: user.password_hash,
        });
        Ok(created)
    }

    async fn get_user_for_login(&self, identity: &str) -> DomainResult<UserCredentials> {
        let state = self.state()?;
        state
            .users
            .iter()
            .find(|c| {
                c.user.email.eq_ignore_ascii_case(identity)
                    || c.user.username.eq_ignore_ascii_case(identity)
            })
            .cloned()
            .ok_or_else(|| DomainError::NotFound("User not found".to_string()))
    }

    async fn get_user_by_id(&self, id: Uuid) -> DomainResult<User> {
        let state = self.state()?;
        state
            .user(id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))
    }

    async fn update_user_by_id(&self, id: Uuid, changes: UserChanges) -> DomainResult<Option<String>> {
        let mut state = self.state()?;
        state.check_unique(Some(id), &changes.username, &changes.email)?;

        let entry = state
            .users
            .iter_mut()
            .find(|c| c.user.id == id)
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))?;

        let previous = entry.user.avatar_link.clone();
        entry.user.username = changes.username;
        entry.user.email = changes.email;
        if let Some(hash) = changes.password_hash {
            entry.password_hash = hash;
        }
        if changes.avatar_link.is_some() {
            entry.user.avatar_link = changes.avatar_link;
        }
        entry.user.updated_at = Utc::now();

        Ok(previous)
    }

    async fn search_users_by_username(&self, username: &str) -> DomainResult<Vec<UserSummary>> {
        let state = self.state()?;
        let needle = username.to_lowercase();

        let mut hits: Vec<UserSummary> = state
            .users
            .iter()
            .filter(|c| c.user.username.to_lowercase().contains(&needle))
            .map(|c| UserSummary::from(&c.user))
            .collect();
        hits.sort_by(|a, b| a.username.cmp(&b.username));
        hits.truncate(USER_SEARCH_LIMIT as usize);
        Ok(hits)
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn add_project(&self, owner_id: Uuid, payload: &ProjectPayload) -> DomainResult<Uuid> {
        let mut state = self.state()?;

        let owner = state
            .user(owner_id)
            .map(|u| u.username.clone())
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", owner_id)))?;
        let members = state.summaries(&payload.members_id)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        state.projects.push(Project {
            id,
            title: payload.title.clone(),
            detail: payload.detail.clone(),
            priority: payload.priority,
            status: payload.status,
            owner_id,
            owner_username: owner,
            members,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn get_project_by_id(&self, id: Uuid) -> DomainResult<Project> {
        let state = self.state()?;
        let mut project = state
            .projects
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("Project {} not found", id)))?;

        // Usernames may have changed since the membership was written
        let ids: Vec<Uuid> = project.members.iter().map(|m| m.id).collect();
        project.members = state.summaries(&ids)?;
        if let Some(owner) = state.user(project.owner_id) {
            project.owner_username = owner.username.clone();
        }
        Ok(project)
    }

    async fn get_project_members(&self, id: Uuid) -> DomainResult<Vec<UserSummary>> {
        Ok(self.get_project_by_id(id).await?.members)
    }

    async fn update_project_by_id(&self, id: Uuid, payload: &ProjectPayload) -> DomainResult<()> {
        let mut state = self.state()?;
        if !state.projects.iter().any(|p| p.id == id) {
            return Err(DomainError::NotFound(format!("Project {} not found", id)));
        }
        let members = state.summaries(&payload.members_id)?;

        if let Some(project) = state.projects.iter_mut().find(|p| p.id == id) {
            project.title = payload.title.clone();
            project.detail = payload.detail.clone();
            project.priority = payload.priority;
            project.status = payload.status;
            project.members = members;
            project.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_project_by_id(&self, id: Uuid) -> DomainResult<()> {
        let mut state = self.state()?;
        let before = state.projects.len();
        state.projects.retain(|p| p.id != id);
        if state.projects.len() == before {
            return Err(DomainError::NotFound(format!("Project {} not found", id)));
        }

        for task in state.tasks.iter_mut().filter(|t| t.project_id == Some(id)) {
            task.project_id = None;
            task.project_title = None;
        }
        Ok(())
    }

    async fn get_projects_by_owner(&self, user_id: Uuid) -> DomainResult<Vec<PreviewProject>> {
        let state = self.state()?;
        Ok(state
            .projects
            .iter()
            .filter(|p| p.owner_id == user_id)
            .map(|p| PreviewProject {
                id: p.id,
                title: p.title.clone(),
            })
            .collect())
    }

    async fn get_projects_by_member(&self, user_id: Uuid) -> DomainResult<Vec<PreviewProject>> {
        let state = self.state()?;
        Ok(state
            .projects
            .iter()
            .filter(|p| p.members.iter().any(|m| m.id == user_id))
            .map(|p| PreviewProject {
                id: p.id,
                title: p.title.clone(),
            })
            .collect())
    }

    async fn get_project_owner(&self, id: Uuid) -> DomainResult<Uuid> {
        let state = self.state()?;
        state
            .projects
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.owner_id)
            .ok_or_else(|| DomainError::NotFound(format!("Project {} not found", id)))
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn add_task(&self, owner_id: Uuid, payload: &TaskPayload) -> DomainResult<Uuid> {
        let mut state = self.state()?;

        let owner = state
            .user(owner_id)
            .map(|u| u.username.clone())
            .ok_or_else(|| DomainError::NotFound(format!("User {} not found", owner_id)))?;
        let project_title = state.project_title(payload.project_id)?;
        let assignees = state.summaries(&payload.assigned_to_id)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        state.tasks.push(Task {
            id,
            title: payload.title.clone(),
            description: payload.description.clone(),
            detail: payload.detail.clone(),
            priority: payload.priority,
            status: payload.status,
            project_id: payload.project_id,
            project_title,
            owner_id,
            owner_username: owner,
            due_date: payload.due_date,
            assignees,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn get_task_by_id(&self, id: Uuid) -> DomainResult<Task> {
        let state = self.state()?;
        state
            .tasks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("Task {} not found", id)))
    }

    async fn update_task_by_id(&self, id: Uuid, payload: &TaskPayload) -> DomainResult<()> {
        let mut state = self.state()?;
        if !state.tasks.iter().any(|t| t.id == id) {
            return Err(DomainError::NotFound(format!("Task {} not found", id)));
        }
        let project_title = state.project_title(payload.project_id)?;
        let assignees = state.summaries(&payload.assigned_to_id)?;

        if let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) {
            task.title = payload.title.clone();
            task.description = payload.description.clone();
            task.detail = payload.detail.clone();
            task.priority = payload.priority;
            task.status = payload.status;
            task.project_id = payload.project_id;
            task.project_title = project_title;
            task.due_date = payload.due_date;
            task.assignees = assignees;
            task.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_task_by_id(&self, id: Uuid) -> DomainResult<()> {
        let mut state = self.state()?;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Err(DomainError::NotFound(format!("Task {} not found", id)));
        }
        Ok(())
    }

    async fn get_tasks_by_project(&self, project_id: Uuid) -> DomainResult<Vec<PreviewTask>> {
        let state = self.state()?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.project_id == Some(project_id))
            .map(|t| state.task_preview(t))
            .collect())
    }

    async fn get_tasks_by_owner(&self, user_id: Uuid) -> DomainResult<Vec<PreviewTask>> {
        let state = self.state()?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.owner_id == user_id)
            .map(|t| state.task_preview(t))
            .collect())
    }

    async fn get_tasks_by_assigned_user(&self, user_id: Uuid) -> DomainResult<Vec<PreviewTask>> {
        let state = self.state()?;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.assignees.iter().any(|a| a.id == user_id))
            .map(|t| state.task_preview(t))
            .collect())
    }

    async fn get_task_owner(&self, id: Uuid) -> DomainResult<Uuid> {
        let state = self.state()?;
        state
            .tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.owner_id)
            .ok_or_else(|| DomainError::NotFound(format!("Task {} not found", id)))
    }
}

/// Expiring key/value map
#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let now = Instant::now();
        lock(&self.entries).values().filter(|(_, at)| *at > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        let mut entries = lock(&self.entries);
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> DomainResult<()> {
        lock(&self.entries).insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> DomainResult<bool> {
        Ok(lock(&self.entries).remove(key).is_some())
    }

    async fn ping(&self) -> DomainResult<bool> {
        Ok(true)
    }
}

/// Object store held in a map
#[derive(Default)]
pub struct InMemoryFileStore {
    objects: Mutex<HashMap<String, Bytes>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.objects).contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn upload(&self, data: Bytes) -> DomainResult<String> {
        let format = validate_avatar(&data)?;
        let key = format!("{}.{}", Uuid::new_v4(), format.extension());
        lock(&self.objects).insert(key.clone(), data);
        Ok(key)
    }

    async fn get(&self, key: &str) -> DomainResult<StoredObject> {
        let format = validate_key(key)?;
        lock(&self.objects)
            .get(key)
            .cloned()
            .map(|data| StoredObject {
                data,
                content_type: format.content_type(),
            })
            .ok_or_else(|| DomainError::NotFound(format!("Object '{}' not found", key)))
    }

    async fn remove(&self, key: &str) -> DomainResult<()> {
        validate_key(key)?;
        lock(&self.objects).remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Priority, Status};
    use chrono::NaiveDate;

    async fn add_user(store: &InMemoryStore, name: &str) -> User {
        store
            .add_user(NewUser {
                id: Uuid::new_v4(),
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    fn task_payload(assignees: Vec<Uuid>) -> TaskPayload {
        TaskPayload {
            title: "Write docs".to_string(),
            description: "Describe the API".to_string(),
            detail: None,
            priority: Priority::Low,
            status: Status::ToDo,
            project_id: None,
            due_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            assigned_to_id: assignees,
        }
    }

    #[tokio::test]
    async fn test_usernames_unique_case_insensitive() {
        let store = InMemoryStore::new();
        add_user(&store, "pixie").await;

        let result = store
            .add_user(NewUser {
                id: Uuid::new_v4(),
                username: "PIXIE".to_string(),
                email: "other@example.com".to_string(),
                password_hash: "hash".to_string(),
            })
            .await;
        assert!(matches!(result, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unknown_assignee_is_not_found() {
        let store = InMemoryStore::new();
        let owner = add_user(&store, "owner").await;

        let result = store.add_task(owner.id, &task_payload(vec![Uuid::new_v4()])).await;
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unavailable_store_fails() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.get_tasks_by_owner(Uuid::new_v4()).await,
            Err(DomainError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_cache_expiry() {
        let cache = InMemoryCache::new();
        cache.set_ex("a", "1", Duration::from_secs(60)).await.unwrap();
        cache.set_ex("b", "2", Duration::ZERO).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), Some("1".to_string()));
        assert_eq!(cache.get("b").await.unwrap(), None);
        assert_eq!(cache.len(), 1);
    }
}
