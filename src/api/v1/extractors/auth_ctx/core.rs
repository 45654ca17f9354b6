use axum::extract::FromRequestParts;
use axum::http::{Extensions, request::Parts};

use crate::error::AppError;

use super::AuthCtx;

impl AuthCtx {
    /// middleware が insert した AuthCtx を取り出す
    /// 無ければ 401 (認証がかかってない・ミドルウェア未設定)
    pub fn from_extensions(extensions: &Extensions) -> Result<Self, AppError> {
        extensions.get::<AuthCtx>().copied().ok_or_else(|| {
            tracing::error!("AuthCtx missing; route is not behind the access middleware");
            AppError::Unauthorized
        })
    }
}

/// Handler で、 AuthCtx を受け取るための extractor
pub struct AuthCtxExtractor(pub AuthCtx);

impl<S> FromRequestParts<S> for AuthCtxExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        AuthCtx::from_extensions(&parts.extensions).map(AuthCtxExtractor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn reads_the_inserted_identity() {
        let mut ext = Extensions::new();
        let id = Uuid::new_v4();
        ext.insert(AuthCtx::new(id));

        assert_eq!(AuthCtx::from_extensions(&ext).unwrap().user_id, id);
    }

    #[test]
    fn missing_identity_is_unauthorized() {
        let ext = Extensions::new();
        assert!(matches!(
            AuthCtx::from_extensions(&ext),
            Err(AppError::Unauthorized)
        ));
    }
}
