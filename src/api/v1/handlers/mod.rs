/*
 * Responsibility
 * - handler の module 宣言
 * - axum の extractor rejection を AppError (JSON 400) に揃える helper
 */
use axum::{
    Json,
    extract::{
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
};

use crate::error::AppError;

pub mod accounts;
pub mod health;
pub mod snippets;

pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!(error = %rejection, "request body rejected");
        AppError::bad_request("INVALID_PAYLOAD", "invalid request payload")
    })
}

pub(crate) fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params.map(|Query(q)| q).map_err(|rejection| {
        tracing::debug!(error = %rejection, "query string rejected");
        AppError::bad_request("INVALID_QUERY", "invalid query parameters")
    })
}
