/// PostgreSQL adapter for [`UserRepository`]

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{UserRepository, USER_SEARCH_LIMIT};
use crate::error::{DomainError, DomainResult};
use crate::models::{NewUser, User, UserChanges, UserCredentials, UserSummary};

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes LIKE metacharacters so the search term matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn add_user(&self, user: NewUser) -> DomainResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, avatar_link, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn get_user_for_login(&self, identity: &str) -> DomainResult<UserCredentials> {
        sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, username, email, avatar_link, created_at, updated_at, password_hash
            FROM users
            WHERE LOWER(email) = LOWER($1) OR LOWER(username) = LOWER($1)
            "#,
        )
        .bind(identity)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DomainError::NotFound("User not found".to_string()))
    }

    async fn get_user_by_id(&self, id: Uuid) -> DomainResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, avatar_link, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))
    }

    async fn update_user_by_id(&self, id: Uuid, changes: UserChanges) -> DomainResult<Option<String>> {
        let mut tx = self.pool.begin().await?;

        let previous_avatar = sqlx::query_scalar::<_, Option<String>>(
            "SELECT avatar_link FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("User {} not found", id)))?;

        sqlx::query(
            r#"
            UPDATE users
            SET username = $2,
                email = $3,
                password_hash = COALESCE($4, password_hash),
                avatar_link = COALESCE($5, avatar_link),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(&changes.avatar_link)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(previous_avatar)
    }

    async fn search_users_by_username(&self, username: &str) -> DomainResult<Vec<UserSummary>> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, username
            FROM users
            WHERE username ILIKE '%' || $1 || '%'
            ORDER BY username
            LIMIT $2
            "#,
        )
        .bind(escape_like(username))
        .bind(USER_SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}
