/*
 * Responsibility
 * - snippets CRUD
 * - owner (user_id) は作成時に固定、以後変更しない
 * - user_id の FK (CASCADE) 前提で削除挙動を意識
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnippetRow {
    pub snippet_id: Uuid,
    pub title: String,
    pub language: String,
    pub content: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Client-editable snippet fields (create and full replace).
#[derive(Debug, Clone)]
pub struct SnippetFields {
    pub title: String,
    pub language: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    #[default]
    UpdatedAt,
    Title,
    Language,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(Self::CreatedAt),
            "updated_at" => Some(Self::UpdatedAt),
            "title" => Some(Self::Title),
            "language" => Some(Self::Language),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
            Self::Language => "language",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SnippetQuery {
    pub language: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

/// Storage collaborator for snippets.
///
/// Every method that touches a single snippet also takes the owner, so the
/// statements themselves are owner-filtered; `find_owner` is what the
/// ownership guard runs first.
#[async_trait]
pub trait SnippetRepo: Send + Sync + 'static {
    async fn find_owner(&self, snippet_id: Uuid) -> RepoResult<Option<Uuid>>;

    async fn create(&self, owner: Uuid, fields: &SnippetFields) -> RepoResult<SnippetRow>;

    async fn get(&self, snippet_id: Uuid, owner: Uuid) -> RepoResult<Option<SnippetRow>>;

    async fn update(
        &self,
        snippet_id: Uuid,
        owner: Uuid,
        fields: &SnippetFields,
    ) -> RepoResult<Option<SnippetRow>>;

    // Returns the deleted row.
    async fn delete(&self, snippet_id: Uuid, owner: Uuid) -> RepoResult<Option<SnippetRow>>;

    async fn list_by_owner(&self, owner: Uuid, query: &SnippetQuery) -> RepoResult<Vec<SnippetRow>>;
}

#[derive(Clone, Debug)]
pub struct PgSnippetRepo {
    pool: PgPool,
}

impl PgSnippetRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnippetRepo for PgSnippetRepo {
    async fn find_owner(&self, snippet_id: Uuid) -> RepoResult<Option<Uuid>> {
        let owner = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM snippets
            WHERE snippet_id = $1
            "#,
        )
        .bind(snippet_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(owner)
    }

    async fn create(&self, owner: Uuid, fields: &SnippetFields) -> RepoResult<SnippetRow> {
        let row = sqlx::query_as::<_, SnippetRow>(
            r#"
            INSERT INTO snippets (title, language, content, user_id)
            VALUES ($1, $2, $3, $4)
            RETURNING
                snippet_id, title, language, content, user_id, created_at, updated_at
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.language)
        .bind(&fields.content)
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn get(&self, snippet_id: Uuid, owner: Uuid) -> RepoResult<Option<SnippetRow>> {
        let row = sqlx::query_as::<_, SnippetRow>(
            r#"
            SELECT
                snippet_id, title, language, content, user_id, created_at, updated_at
            FROM snippets
            WHERE snippet_id = $1 AND user_id = $2
            "#,
        )
        .bind(snippet_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(
        &self,
        snippet_id: Uuid,
        owner: Uuid,
        fields: &SnippetFields,
    ) -> RepoResult<Option<SnippetRow>> {
        let row = sqlx::query_as::<_, SnippetRow>(
            r#"
            UPDATE snippets
            SET
                title = $3,
                language = $4,
                content = $5,
                updated_at = NOW()
            WHERE snippet_id = $1 AND user_id = $2
            RETURNING
                snippet_id, title, language, content, user_id, created_at, updated_at
            "#,
        )
        .bind(snippet_id)
        .bind(owner)
        .bind(&fields.title)
        .bind(&fields.language)
        .bind(&fields.content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, snippet_id: Uuid, owner: Uuid) -> RepoResult<Option<SnippetRow>> {
        let row = sqlx::query_as::<_, SnippetRow>(
            r#"
            DELETE FROM snippets
            WHERE snippet_id = $1 AND user_id = $2
            RETURNING
                snippet_id, title, language, content, user_id, created_at, updated_at
            "#,
        )
        .bind(snippet_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_by_owner(&self, owner: Uuid, query: &SnippetQuery) -> RepoResult<Vec<SnippetRow>> {
        // ORDER BY cannot be bound; both pieces come from closed enums.
        let sql = format!(
            r#"
            SELECT
                snippet_id, title, language, content, user_id, created_at, updated_at
            FROM snippets
            WHERE user_id = $1
              AND ($2::text IS NULL OR language = $2)
            ORDER BY {} {}, snippet_id
            "#,
            query.sort.column(),
            query.order.keyword(),
        );

        let rows = sqlx::query_as::<_, SnippetRow>(&sql)
            .bind(owner)
            .bind(query.language.as_deref())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
