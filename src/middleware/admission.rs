/*
 * Responsibility
 * - プロセス全体で共有する admission gate
 * - 認証より前に走らせる (credential が無くても bucket が空なら 429)
 */
use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Gate every route of `router` behind the shared token bucket.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, admission_middleware))
}

async fn admission_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !state.admission.allow() {
        tracing::warn!(
            method = %req.method(),
            path = %req.uri().path(),
            "admission rejected"
        );
        return Err(AppError::TooManyRequests);
    }

    Ok(next.run(req).await)
}
