/*
 * Responsibility
 * - 単一リソースを対象とする操作 (read/update/delete) の前に所有者を確認する
 * - NotFound と AccessDenied はログでは区別し、HTTP では同一の 404 に畳む
 * - owner lookup は deadline 付き (timeout は拒否扱い、許可にはしない)
 */
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Error)]
pub enum OwnershipError {
    #[error("{resource} not found")]
    NotFound { resource: &'static str },
    #[error("{resource} is owned by another identity")]
    AccessDenied { resource: &'static str },
    #[error("owner lookup timed out")]
    Timeout,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Confirm `caller` owns `resource_id` before the operation runs.
///
/// `lookup_owner` is the storage collaborator (`FindOwnerByResourceID`); it is
/// re-run on every call, nothing is cached.
pub async fn ensure_owner<F, Fut>(
    resource: &'static str,
    resource_id: Uuid,
    caller: Uuid,
    deadline: Duration,
    lookup_owner: F,
) -> Result<(), OwnershipError>
where
    F: FnOnce(Uuid) -> Fut,
    Fut: Future<Output = RepoResult<Option<Uuid>>>,
{
    let owner = tokio::time::timeout(deadline, lookup_owner(resource_id))
        .await
        .map_err(|_| {
            error!(resource, %resource_id, ?deadline, "owner lookup timed out");
            OwnershipError::Timeout
        })?
        .map_err(|e| {
            error!(resource, %resource_id, error = ?e, "owner lookup failed");
            OwnershipError::from(e)
        })?;

    match owner {
        None => {
            warn!(resource, %resource_id, %caller, reason = "not_found", "ownership check rejected");
            Err(OwnershipError::NotFound { resource })
        }
        Some(owner) if owner != caller => {
            warn!(resource, %resource_id, %caller, reason = "access_denied", "ownership check rejected");
            Err(OwnershipError::AccessDenied { resource })
        }
        Some(_) => Ok(()),
    }
}
