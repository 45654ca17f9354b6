/*
 * Responsibility
 * - in-memory storage backend (STORAGE_BACKEND=memory)
 * - services が依存する Postgres の意味を再現
 *   (email / username の一意性、owner 絞り込み、user 削除時の cascade、FK)
 * - 状態は 1 つの Mutex の中、.await を跨いで lock を持たない
 */
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::snippet_repo::{
    SnippetFields, SnippetQuery, SnippetRepo, SnippetRow, SortField, SortOrder,
};
use crate::repos::user_repo::{NewUser, UserCredentialRow, UserRepo, UserRow};

#[derive(Debug, Clone)]
struct StoredUser {
    row: UserRow,
    password_hash: String,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, StoredUser>,
    snippets: HashMap<Uuid, SnippetRow>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn create(&self, user: &NewUser) -> RepoResult<UserRow> {
        let mut tables = self.tables();

        let taken = tables
            .users
            .values()
            .any(|u| u.row.email == user.email || u.row.username == user.username);
        if taken {
            return Err(RepoError::Conflict);
        }

        let row = UserRow {
            user_id: Uuid::new_v4(),
            username: user.username.clone(),
            email: user.email.clone(),
            created_at: Utc::now(),
        };
        tables.users.insert(
            row.user_id,
            StoredUser {
                row: row.clone(),
                password_hash: user.password_hash.clone(),
            },
        );

        Ok(row)
    }

    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentialRow>> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.row.email == email)
            .map(|u| UserCredentialRow {
                user_id: u.row.user_id,
                password_hash: u.password_hash.clone(),
            }))
    }

    async fn delete(&self, user_id: Uuid) -> RepoResult<bool> {
        let mut tables = self.tables();
        let removed = tables.users.remove(&user_id).is_some();
        if removed {
            tables.snippets.retain(|_, s| s.user_id != user_id);
        }
        Ok(removed)
    }

    async fn update_password_hash(&self, user_id: Uuid, password_hash: &str) -> RepoResult<bool> {
        Ok(match self.tables().users.get_mut(&user_id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }
}

#[async_trait]
impl SnippetRepo for MemoryStore {
    async fn find_owner(&self, snippet_id: Uuid) -> RepoResult<Option<Uuid>> {
        Ok(self.tables().snippets.get(&snippet_id).map(|s| s.user_id))
    }

    async fn create(&self, owner: Uuid, fields: &SnippetFields) -> RepoResult<SnippetRow> {
        let mut tables = self.tables();
        // foreign key: snippets.user_id -> users.user_id
        if !tables.users.contains_key(&owner) {
            return Err(RepoError::MissingParent);
        }

        let now = Utc::now();
        let row = SnippetRow {
            snippet_id: Uuid::new_v4(),
            title: fields.title.clone(),
            language: fields.language.clone(),
            content: fields.content.clone(),
            user_id: owner,
            created_at: now,
            updated_at: now,
        };
        tables.snippets.insert(row.snippet_id, row.clone());

        Ok(row)
    }

    async fn get(&self, snippet_id: Uuid, owner: Uuid) -> RepoResult<Option<SnippetRow>> {
        Ok(self
            .tables()
            .snippets
            .get(&snippet_id)
            .filter(|s| s.user_id == owner)
            .cloned())
    }

    async fn update(
        &self,
        snippet_id: Uuid,
        owner: Uuid,
        fields: &SnippetFields,
    ) -> RepoResult<Option<SnippetRow>> {
        let mut tables = self.tables();
        let Some(row) = tables
            .snippets
            .get_mut(&snippet_id)
            .filter(|s| s.user_id == owner)
        else {
            return Ok(None);
        };

        row.title = fields.title.clone();
        row.language = fields.language.clone();
        row.content = fields.content.clone();
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }

    async fn delete(&self, snippet_id: Uuid, owner: Uuid) -> RepoResult<Option<SnippetRow>> {
        let mut tables = self.tables();
        let owned = tables
            .snippets
            .get(&snippet_id)
            .is_some_and(|s| s.user_id == owner);

        Ok(if owned {
            tables.snippets.remove(&snippet_id)
        } else {
            None
        })
    }

    async fn list_by_owner(&self, owner: Uuid, query: &SnippetQuery) -> RepoResult<Vec<SnippetRow>> {
        let mut rows: Vec<SnippetRow> = self
            .tables()
            .snippets
            .values()
            .filter(|s| s.user_id == owner)
            .filter(|s| query.language.as_deref().is_none_or(|l| s.language == l))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ord = match query.sort {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::Title => a.title.cmp(&b.title),
                SortField::Language => a.language.cmp(&b.language),
            };
            let ord = match query.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            ord.then_with(|| a.snippet_id.cmp(&b.snippet_id))
        });

        Ok(rows)
    }
}
