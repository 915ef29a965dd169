/// Accounts, sessions and profiles
///
/// # Session lifecycle
///
/// ```text
/// login ──> access token (15 min) + refresh token (7 days)
///             │                        │
///             │                        └─ refresh_token:{jti} = user id
///             │
/// refresh ──> new access token while refresh_token:{jti} exists
/// logout ───> delete refresh_token:{jti}, set revoked_access:{jti} until expiry
/// ```

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::jwt::{IssuedToken, TokenManager, TokenType};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::auth::session::{refresh_session_key, revoked_access_key, AuthContext};
use crate::cache::{get_json, set_json, Cache};
use crate::error::{DomainError, DomainResult};
use crate::models::{
    LoginUserPayload, NewUser, RegisterUserPayload, UpdateUserPayload, User, UserChanges,
    UserSummary,
};
use crate::repository::UserRepository;
use crate::storage::{FileStore, StoredObject};
use crate::validation::validate_payload;

/// Lifetime of cached user profiles
pub const USER_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

const BAD_LOGIN: &str = "Invalid email/username or password";

fn user_cache_key(id: Uuid) -> String {
    format!("user:{}", id)
}

/// Tokens handed out by a successful login
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

fn password_failure(err: crate::auth::password::PasswordError) -> DomainError {
    DomainError::Storage(err.to_string())
}

fn to_std(duration: chrono::Duration) -> Duration {
    duration.to_std().unwrap_or(Duration::ZERO)
}

pub struct UserUseCase {
    users: Arc<dyn UserRepository>,
    cache: Arc<dyn Cache>,
    files: Arc<dyn FileStore>,
    tokens: Arc<TokenManager>,
}

impl UserUseCase {
    pub fn new(
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn Cache>,
        files: Arc<dyn FileStore>,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            users,
            cache,
            files,
            tokens,
        }
    }

    pub async fn register(&self, payload: RegisterUserPayload) -> DomainResult<User> {
        validate_payload(&payload)?;
        validate_password_strength(&payload.password)
            .map_err(|msg| DomainError::invalid_field("password", msg))?;

        let password_hash = hash_password(&payload.password).map_err(password_failure)?;

        let user = self
            .users
            .add_user(NewUser {
                id: Uuid::new_v4(),
                username: payload.username,
                email: payload.email,
                password_hash,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Verifies credentials and opens a refresh session
    ///
    /// Unknown identities and wrong passwords produce the same error.
    pub async fn login(&self, payload: LoginUserPayload) -> DomainResult<LoginSession> {
        validate_payload(&payload)?;

        let credentials = match self.users.get_user_for_login(payload.identity.trim()).await {
            Ok(credentials) => credentials,
            Err(DomainError::NotFound(_)) => {
                return Err(DomainError::InvalidCredentials(BAD_LOGIN.to_string()))
            }
            Err(e) => return Err(e),
        };

        if !verify_password(&payload.password, &credentials.password_hash).map_err(password_failure)? {
            warn!(user_id = %credentials.user.id, "Login with wrong password");
            return Err(DomainError::InvalidCredentials(BAD_LOGIN.to_string()));
        }

        let user = credentials.user;
        let access = self.tokens.issue(user.id, TokenType::Access)?;
        let refresh = self.tokens.issue(user.id, TokenType::Refresh)?;

        self.cache
            .set_ex(
                &refresh_session_key(refresh.claims.jti),
                &user.id.to_string(),
                to_std(self.tokens.ttl(TokenType::Refresh)),
            )
            .await?;

        info!(user_id = %user.id, "User logged in");
        Ok(LoginSession {
            user,
            access,
            refresh,
        })
    }

    /// Exchanges a live refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> DomainResult<IssuedToken> {
        let claims = self.tokens.validate_refresh(refresh_token)?;

        let session = self.cache.get(&refresh_session_key(claims.jti)).await?;
        if session.as_deref() != Some(claims.sub.to_string().as_str()) {
            return Err(DomainError::InvalidCredentials(
                "Session expired or logged out".to_string(),
            ));
        }

        Ok(self.tokens.issue(claims.sub, TokenType::Access)?)
    }

    /// Validates an access token and rejects revoked ones
    pub async fn authenticate(&self, access_token: &str) -> DomainResult<AuthContext> {
        let claims = self.tokens.validate_access(access_token)?;

        if self.cache.get(&revoked_access_key(claims.jti)).await?.is_some() {
            return Err(DomainError::InvalidCredentials("Token has been revoked".to_string()));
        }

        Ok(AuthContext::from_claims(&claims))
    }

    /// Revokes the presented access token and, when given, the refresh session
    pub async fn logout(&self, auth: &AuthContext, refresh_token: Option<&str>) -> DomainResult<()> {
        // `exp` has whole-second precision, so keep the entry one second past it
        let remaining = to_std(auth.expires_at - Utc::now()) + Duration::from_secs(1);
        self.cache
            .set_ex(&revoked_access_key(auth.token_id), "1", remaining)
            .await?;

        if let Some(token) = refresh_token {
            let claims = self.tokens.validate_refresh(token)?;
            if claims.sub != auth.user_id {
                return Err(DomainError::Forbidden(
                    "Refresh token belongs to another user".to_string(),
                ));
            }
            self.cache.delete(&refresh_session_key(claims.jti)).await?;
        }

        info!(user_id = %auth.user_id, "User logged out");
        Ok(())
    }

    /// Cache-aside read; cache failures fall back to the repository
    pub async fn get_user_by_id(&self, id: Uuid) -> DomainResult<User> {
        let key = user_cache_key(id);

        match get_json::<User>(self.cache.as_ref(), &key).await {
            Ok(Some(user)) => return Ok(user),
            Ok(None) => {}
            Err(e) => warn!(user_id = %id, error = %e, "User cache read failed"),
        }

        let user = self.users.get_user_by_id(id).await?;

        if let Err(e) = set_json(self.cache.as_ref(), &key, &user, USER_CACHE_TTL).await {
            warn!(user_id = %id, error = %e, "User cache write failed");
        }
        Ok(user)
    }

    /// Replaces the caller's own profile
    ///
    /// A new avatar is uploaded before the row is updated; the previous avatar
    /// object is removed only after the update commits.
    pub async fn update_user(
        &self,
        auth: &AuthContext,
        id: Uuid,
        payload: UpdateUserPayload,
        avatar: Option<Bytes>,
    ) -> DomainResult<User> {
        if auth.user_id != id {
            return Err(DomainError::Forbidden(
                "You can only update your own profile".to_string(),
            ));
        }

        validate_payload(&payload)?;

        let password_hash = match payload.password.as_deref() {
            Some(password) => {
                validate_password_strength(password)
                    .map_err(|msg| DomainError::invalid_field("password", msg))?;
                Some(hash_password(password).map_err(password_failure)?)
            }
            None => None,
        };

        let new_avatar = match avatar {
            Some(data) => Some(self.files.upload(data).await?),
            None => None,
        };

        let changes = UserChanges {
            username: payload.username,
            email: payload.email,
            password_hash,
            avatar_link: new_avatar.clone(),
        };

        let previous_avatar = match self.users.update_user_by_id(id, changes).await {
            Ok(previous) => previous,
            Err(e) => {
                if let Some(key) = &new_avatar {
                    if let Err(cleanup) = self.files.remove(key).await {
                        warn!(key = %key, error = %cleanup, "Failed to remove orphaned avatar");
                    }
                }
                return Err(e);
            }
        };

        if let (Some(_), Some(old)) = (&new_avatar, previous_avatar) {
            if let Err(e) = self.files.remove(&old).await {
                warn!(key = %old, error = %e, "Failed to remove replaced avatar");
            }
        }

        if let Err(e) = self.cache.delete(&user_cache_key(id)).await {
            warn!(user_id = %id, error = %e, "User cache invalidation failed");
        }

        info!(user_id = %id, avatar_replaced = new_avatar.is_some(), "User profile updated");
        self.users.get_user_by_id(id).await
    }

    pub async fn search_users(&self, username: &str) -> DomainResult<Vec<UserSummary>> {
        let term = username.trim();
        if term.is_empty() {
            return Err(DomainError::invalid_field("username", "Username is required"));
        }
        self.users.search_users_by_username(term).await
    }

    pub async fn get_avatar(&self, key: &str) -> DomainResult<StoredObject> {
        self.files.get(key).await
    }
}
