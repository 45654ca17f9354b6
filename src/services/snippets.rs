/*
 * Responsibility
 * - Snippet の use-case (create / get / update / delete / list)
 * - 単一 snippet 操作は storage に触る前に必ず ownership guard を通す
 */
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::repos::snippet_repo::{SnippetFields, SnippetQuery, SnippetRepo, SnippetRow};
use crate::services::ownership::ensure_owner;

const RESOURCE: &str = "snippet";

#[derive(Clone)]
pub struct SnippetService {
    repo: Arc<dyn SnippetRepo>,
    lookup_timeout: Duration,
}

impl fmt::Debug for SnippetService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnippetService")
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}

impl SnippetService {
    pub fn new(repo: Arc<dyn SnippetRepo>, lookup_timeout: Duration) -> Self {
        Self {
            repo,
            lookup_timeout,
        }
    }

    async fn guard(&self, snippet_id: Uuid, caller: Uuid) -> Result<(), AppError> {
        ensure_owner(RESOURCE, snippet_id, caller, self.lookup_timeout, |id| {
            self.repo.find_owner(id)
        })
        .await?;
        Ok(())
    }

    pub async fn create(&self, caller: Uuid, fields: &SnippetFields) -> Result<SnippetRow, AppError> {
        let row = self
            .repo
            .create(caller, fields)
            .await
            .map_err(storage_failure("create"))?;
        debug!(snippet_id = %row.snippet_id, owner = %caller, "snippet created");
        Ok(row)
    }

    pub async fn get(&self, caller: Uuid, snippet_id: Uuid) -> Result<SnippetRow, AppError> {
        self.guard(snippet_id, caller).await?;

        // guard の後に消された場合も NotFound
        self.repo
            .get(snippet_id, caller)
            .await
            .map_err(storage_failure("get"))?
            .ok_or(AppError::not_found(RESOURCE))
    }

    pub async fn update(
        &self,
        caller: Uuid,
        snippet_id: Uuid,
        fields: &SnippetFields,
    ) -> Result<SnippetRow, AppError> {
        self.guard(snippet_id, caller).await?;

        let row = self
            .repo
            .update(snippet_id, caller, fields)
            .await
            .map_err(storage_failure("update"))?
            .ok_or(AppError::not_found(RESOURCE))?;
        debug!(%snippet_id, owner = %caller, "snippet updated");
        Ok(row)
    }

    pub async fn delete(&self, caller: Uuid, snippet_id: Uuid) -> Result<SnippetRow, AppError> {
        self.guard(snippet_id, caller).await?;

        let row = self
            .repo
            .delete(snippet_id, caller)
            .await
            .map_err(storage_failure("delete"))?
            .ok_or(AppError::not_found(RESOURCE))?;
        debug!(%snippet_id, owner = %caller, "snippet deleted");
        Ok(row)
    }

    pub async fn list(&self, caller: Uuid, query: &SnippetQuery) -> Result<Vec<SnippetRow>, AppError> {
        self.repo
            .list_by_owner(caller, query)
            .await
            .map_err(storage_failure("list"))
    }
}

fn storage_failure(op: &'static str) -> impl FnOnce(RepoError) -> AppError {
    move |e| {
        match &e {
            RepoError::Db(err) => error!(op, error = ?err, "snippet storage failed"),
            RepoError::Conflict => debug!(op, "snippet write conflicted"),
            RepoError::MissingParent => warn!(op, "snippet owner no longer exists"),
        }
        AppError::from(e)
    }
}
