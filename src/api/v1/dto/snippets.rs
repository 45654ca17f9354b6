/*
 * Responsibility
 * - Snippets の request/response DTO
 * - 一覧の query (language / sort / order) を SnippetQuery に変換
 * - owner (user_id) は body からは受け取らない (AuthCtx から決まる)
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::repos::snippet_repo::{SnippetFields, SnippetQuery, SnippetRow, SortField, SortOrder};

#[derive(Debug, Deserialize)]
pub struct SnippetRequest {
    pub title: String,
    pub language: String,
    pub content: String,
}

impl SnippetRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("Title can't be empty!");
        }
        if self.language.trim().is_empty() {
            return Err("Language can't be empty!");
        }
        if self.content.trim().is_empty() {
            return Err("Content can't be empty!");
        }
        Ok(())
    }

    pub fn into_fields(self) -> SnippetFields {
        SnippetFields {
            title: self.title,
            language: self.language,
            content: self.content,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListSnippetsParams {
    pub language: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl ListSnippetsParams {
    pub fn into_query(self) -> Result<SnippetQuery, &'static str> {
        const INVALID: &str = "Sort options are invalid";

        let sort = match self.sort.as_deref() {
            None | Some("") => SortField::default(),
            Some(s) => SortField::parse(s).ok_or(INVALID)?,
        };
        let order = match self.order.as_deref() {
            None | Some("") => SortOrder::default(),
            Some(s) => SortOrder::parse(s).ok_or(INVALID)?,
        };

        Ok(SnippetQuery {
            language: self.language.filter(|l| !l.is_empty()),
            sort,
            order,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SnippetResponse {
    pub snippet_id: Uuid,
    pub title: String,
    pub language: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SnippetRow> for SnippetResponse {
    fn from(r: SnippetRow) -> Self {
        Self {
            snippet_id: r.snippet_id,
            title: r.title,
            language: r.language,
            content: r.content,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}
