/// Payload validation helpers
///
/// Use cases call [`validate_payload`] before touching any repository so an
/// invalid payload never reaches the datastore.

use std::collections::HashSet;

use uuid::Uuid;
use validator::Validate;

use crate::error::{DomainError, DomainResult};

/// Runs the payload's `validator` rules, returning `ValidationFailed` with one
/// `{field, message}` entry per broken rule.
pub fn validate_payload<T: Validate>(payload: &T) -> DomainResult<()> {
    payload.validate().map_err(DomainError::from)
}

/// Collapses duplicate IDs, keeping the first occurrence and the input order
pub fn dedup_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
