/*
 * Responsibility
 * - users テーブル向け SQLx 操作
 * - password は hash 済みの PHC 文字列だけを受け取る
 * - email / username の重複は RepoError::Conflict として返す
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UserCredentialRow {
    pub user_id: Uuid,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepo: Send + Sync + 'static {
    async fn create(&self, user: &NewUser) -> RepoResult<UserRow>;

    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentialRow>>;

    // Snippets go with the user (ON DELETE CASCADE).
    async fn delete(&self, user_id: Uuid) -> RepoResult<bool>;

    async fn update_password_hash(&self, user_id: Uuid, password_hash: &str) -> RepoResult<bool>;
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn create(&self, user: &NewUser) -> RepoResult<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING user_id, username, email, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::from_sqlx)?;

        Ok(row)
    }

    async fn find_credentials_by_email(&self, email: &str) -> RepoResult<Option<UserCredentialRow>> {
        let row = sqlx::query_as::<_, UserCredentialRow>(
            r#"
            SELECT user_id, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, user_id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_password_hash(&self, user_id: Uuid, password_hash: &str) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
