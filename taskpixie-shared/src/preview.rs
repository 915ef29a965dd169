/// Preview aggregation
///
/// A user's visible projects (or tasks) are the union of what they own and what
/// they are a member of (or assigned to). The two lists are fetched
/// concurrently and merged into one deduplicated, deterministically ordered
/// list:
///
/// ```text
/// owned:    [A, B]        ┐
///                         ├─ merge ─> [A, B, C]
/// assigned: [B, C]        ┘
/// ```
///
/// Owned entries come first in fetch order, followed by assigned-only entries
/// in fetch order. When both lists contain the same identity the owned entry
/// is kept.

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;

use uuid::Uuid;

use crate::error::DomainResult;
use crate::models::{PreviewProject, PreviewTask};

/// Anything with a stable identity that can appear in a preview list
pub trait PreviewItem {
    type Key: Eq + Hash + Copy;

    fn key(&self) -> Self::Key;
}

impl PreviewItem for PreviewProject {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }
}

impl PreviewItem for PreviewTask {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }
}

/// Merges owned and assigned entries; first-seen wins on identity conflict
pub fn merge_previews<T: PreviewItem>(owned: Vec<T>, assigned: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(owned.len() + assigned.len());
    let mut merged = Vec::with_capacity(owned.len() + assigned.len());

    for item in owned.into_iter().chain(assigned) {
        if seen.insert(item.key()) {
            merged.push(item);
        }
    }

    merged
}

/// Runs both fetches concurrently and merges the results
///
/// # Errors
///
/// Returns the first error from either fetch; no partial list is produced.
pub async fn visible_items<T, O, A>(owned_fetch: O, assigned_fetch: A) -> DomainResult<Vec<T>>
where
    T: PreviewItem,
    O: Future<Output = DomainResult<Vec<T>>>,
    A: Future<Output = DomainResult<Vec<T>>>,
{
    let (owned, assigned) = tokio::try_join!(owned_fetch, assigned_fetch)?;
    Ok(merge_previews(owned, assigned))
}
