/*
 * Responsibility
 * - HTTP 横断的関心事 (/health を含む全 route に適用)
 * - Request-Id の生成 + 伝播 (X-Request-Id)
 * - アクセスログ / request tracing (TraceLayer)
 * - body サイズ制限
 * - request 単位の timeout (REQUEST_TIMEOUT_SECS) → 408
 */
use std::time::Duration;

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::header::HeaderName;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct HttpPolicy {
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl HttpPolicy {
    pub fn with_timeout(request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            body_limit_bytes: BODY_LIMIT_BYTES,
        }
    }
}

pub fn apply(router: Router, policy: HttpPolicy) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    let layers = ServiceBuilder::new()
        // tower の error を AppError の JSON に変換して Infallible にする
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                tracing::warn!("request timed out");
                AppError::RequestTimeout
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                AppError::Internal
            }
        }))
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(RequestBodyLimitLayer::new(policy.body_limit_bytes))
        .layer(TimeoutLayer::new(policy.request_timeout))
        .layer(TraceLayer::new_for_http());

    router.layer(layers)
}
