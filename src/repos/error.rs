/**
 * Responsibility
 * - repo が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
    #[error("conflict")]
    Conflict,
    #[error("referenced row does not exist")]
    MissingParent,
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
    /// Unique violations (23505) become `Conflict`, foreign-key violations (23503) `MissingParent`.
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e {
            match dbe.code().as_deref() {
                Some("23505") => return RepoError::Conflict,
                Some("23503") => return RepoError::MissingParent,
                _ => {}
            }
        }
        RepoError::Db(e)
    }
}
