/// Domain error taxonomy shared by repositories and use cases
///
/// Every failure crossing the repository or use-case boundary is one of these
/// variants. The API crate maps each variant onto exactly one HTTP status.
///
/// # Mapping from sqlx
///
/// | sqlx error | Domain error |
/// |---|---|
/// | `RowNotFound` | `NotFound` |
/// | SQLSTATE `23505` (unique violation) | `Conflict` |
/// | SQLSTATE `23503` (foreign key violation) | `NotFound` |
/// | anything else | `Storage` |

use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

use crate::auth::jwt::JwtError;

/// Result alias used throughout the shared crate
pub type DomainResult<T> = Result<T, DomainError>;

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as it appears in the payload
    pub field: String,

    /// Human-readable reason
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Domain error
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// Requested entity (or a referenced entity) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation on write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payload failed its field constraints
    #[error("Validation failed: {} errors", .0.len())]
    ValidationFailed(Vec<FieldError>),

    /// Acting user may not touch this entity
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Login identity/password or session token rejected
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Datastore, cache or object-store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    /// Shorthand for a single-field validation failure
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::ValidationFailed(vec![FieldError::new(field, message)])
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DomainError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => {
                    let constraint = db_err.constraint().unwrap_or_default();
                    if constraint.contains("username") || constraint.contains("email") {
                        DomainError::Conflict("Username or email already exists".to_string())
                    } else {
                        DomainError::Conflict(format!("Constraint violation: {}", constraint))
                    }
                }
                Some("23503") => DomainError::NotFound(format!(
                    "Referenced record does not exist ({})",
                    db_err.constraint().unwrap_or("foreign key")
                )),
                _ => DomainError::Storage(format!("Database error: {}", db_err)),
            },
            other => DomainError::Storage(format!("Database error: {}", other)),
        }
    }
}

/// Rejected tokens are credential failures; signing failures are internal
impl From<JwtError> for DomainError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => DomainError::Storage(msg),
            other => DomainError::InvalidCredentials(other.to_string()),
        }
    }
}

/// Flattens `validator` output into field errors, sorted by field name so the
/// response is stable.
impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", error.code)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        DomainError::ValidationFailed(details)
    }
}
