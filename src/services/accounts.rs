/*
 * Responsibility
 * - register / login / account 削除 / password 変更
 * - 成功時に TokenCodec で access token を発行
 * - login 失敗 (email 不明 / password 不一致) は同一の Unauthorized
 * - argon2 は CPU を食うので spawn_blocking で回す
 */
use std::fmt;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::repos::error::RepoError;
use crate::repos::user_repo::{NewUser, UserRepo};
use crate::services::auth::password::{hash_password, verify_password};
use crate::services::auth::{IssuedToken, TokenCodec};

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub token: IssuedToken,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepo>,
    tokens: Arc<TokenCodec>,
}

impl fmt::Debug for AccountService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountService")
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepo>, tokens: Arc<TokenCodec>) -> Self {
        Self { users, tokens }
    }

    pub async fn register(&self, input: Registration) -> Result<Session, AppError> {
        let password_hash = hash_blocking(input.password).await?;

        let user = self
            .users
            .create(&NewUser {
                username: input.username,
                email: input.email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepoError::Conflict => {
                    AppError::conflict("USER_EXISTS", "user name or email is already registered")
                }
                RepoError::MissingParent => AppError::Internal,
                RepoError::Db(err) => {
                    error!(error = ?err, "failed to create user");
                    AppError::Internal
                }
            })?;

        info!(user_id = %user.user_id, "user registered");
        self.session(user.user_id)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let user_id = self.authenticate(email, password).await?;
        self.session(user_id)
    }

    pub async fn delete_account(&self, email: &str, password: &str) -> Result<Uuid, AppError> {
        let user_id = self.authenticate(email, password).await?;

        let deleted = self.users.delete(user_id).await.map_err(|e| {
            error!(%user_id, error = ?e, "failed to delete user");
            AppError::from(e)
        })?;
        if !deleted {
            // 認証と削除の間に消えた
            return Err(AppError::Unauthorized);
        }

        info!(%user_id, "account deleted");
        Ok(user_id)
    }

    pub async fn change_password(
        &self,
        email: &str,
        password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if password == new_password {
            return Err(AppError::bad_request(
                "SAME_PASSWORD",
                "new password must differ from the current password",
            ));
        }

        let user_id = self.authenticate(email, password).await?;
        let password_hash = hash_blocking(new_password.to_string()).await?;

        let updated = self
            .users
            .update_password_hash(user_id, &password_hash)
            .await
            .map_err(|e| {
                error!(%user_id, error = ?e, "failed to update password");
                AppError::from(e)
            })?;
        if !updated {
            return Err(AppError::Unauthorized);
        }

        info!(%user_id, "password changed");
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Uuid, AppError> {
        let creds = self
            .users
            .find_credentials_by_email(email)
            .await
            .map_err(|e| {
                error!(error = ?e, "failed to load credentials");
                AppError::from(e)
            })?;

        let Some(creds) = creds else {
            warn!(reason = "unknown_email", "login rejected");
            return Err(AppError::Unauthorized);
        };

        if !verify_blocking(password.to_string(), creds.password_hash).await? {
            warn!(user_id = %creds.user_id, reason = "wrong_password", "login rejected");
            return Err(AppError::Unauthorized);
        }

        Ok(creds.user_id)
    }

    fn session(&self, user_id: Uuid) -> Result<Session, AppError> {
        Ok(Session {
            user_id,
            token: self.tokens.issue(user_id)?,
        })
    }
}

async fn hash_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            error!(error = %e, "password hashing task failed");
            AppError::Internal
        })?
}

async fn verify_blocking(password: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| {
            error!(error = %e, "password verification task failed");
            AppError::Internal
        })?
}
