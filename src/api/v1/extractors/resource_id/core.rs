/*
 * Responsibility
 * - Path の String を UUID として受け、リソースごとの意味付き ID 型にする
 * 置くもの
 *  - ResourceId<T> の定義 (ジェネリック本体)
 *  - impl FromRequestParts for ResourceId<T>
 * 置かないもの
 *  - Snippet など具体リソース名 (types.rs)
 *  - 所有者チェック (services::ownership)
 */
use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use uuid::Uuid;

use crate::error::AppError;

pub struct ResourceId<T> {
    pub id: Uuid,
    _marker: PhantomData<T>,
}

impl<T> ResourceId<T> {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }
}

// derive だと T: Clone/Copy を要求されるので手書き
impl<T> Clone for ResourceId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ResourceId<T> {}

fn parse_or_bad_request(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request("INVALID_ID", "invalid id"))
}

impl<S, T> FromRequestParts<S> for ResourceId<T>
where
    S: Send + Sync,
    T: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::bad_request("INVALID_ID", "invalid id"))?;
        let id = parse_or_bad_request(&raw)?;
        Ok(Self::new(id))
    }
}

impl<T> std::fmt::Debug for ResourceId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceId").field("id", &self.id).finish()
    }
}
