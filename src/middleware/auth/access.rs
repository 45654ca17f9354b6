/*
 * Responsibility
 * - access token (HS256 JWT) 検証 → AuthCtx を extensions に入れる
 * - `Authorization: Bearer <jwt>` を検証し、sub を user_id として AuthCtx に入れる
 * - 失敗理由 (AuthError) はログだけに出し、レスポンスは一律 401
 */
use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::extract_identity;
use crate::state::AppState;

/// 認証が必要な route にだけ middleware を掛ける。
///
/// `route_layer` なので、マッチしない path は 401 ではなく 404 のまま。
///
/// ```ignore
/// let protected = middleware::auth::access::apply(protected, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let now = chrono::Utc::now().timestamp();

    let user_id = match extract_identity(req.headers(), &state.tokens, now) {
        Ok(user_id) => user_id,
        Err(err) => {
            tracing::warn!(
                error = %err,
                kind = ?err,
                method = %req.method(),
                path = %req.uri().path(),
                "access token verification failed"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(%user_id, "request authenticated");

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(user_id));

    Ok(next.run(req).await)
}
