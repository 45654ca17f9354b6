/*
 * Responsibility
 * - /snippets 系 CRUD handler (要認証)
 * - caller は AuthCtxExtractor から、snippet id は SnippetId extractor から受ける
 * - 所有者チェックは SnippetService 側 (handler では判定しない)
 */
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::{
    api::v1::dto::snippets::{ListSnippetsParams, SnippetRequest, SnippetResponse},
    api::v1::extractors::{AuthCtxExtractor, SnippetId},
    api::v1::handlers::{json_body, query_params},
    error::AppError,
    repos::snippet_repo::SnippetFields,
    state::AppState,
};

fn valid_fields(
    payload: Result<Json<SnippetRequest>, JsonRejection>,
) -> Result<SnippetFields, AppError> {
    let req = json_body(payload)?;
    req.validate()
        .map_err(|m| AppError::bad_request("INVALID_PAYLOAD", m))?;
    Ok(req.into_fields())
}

pub async fn list_snippets(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    params: Result<Query<ListSnippetsParams>, QueryRejection>,
) -> Result<Json<Vec<SnippetResponse>>, AppError> {
    let query = query_params(params)?
        .into_query()
        .map_err(|m| AppError::bad_request("INVALID_SORT", m))?;

    let rows = state.snippets.list(ctx.user_id, &query).await?;

    Ok(Json(rows.into_iter().map(SnippetResponse::from).collect()))
}

pub async fn create_snippet(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    payload: Result<Json<SnippetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SnippetResponse>), AppError> {
    let fields = valid_fields(payload)?;
    let row = state.snippets.create(ctx.user_id, &fields).await?;

    Ok((StatusCode::CREATED, Json(row.into())))
}

pub async fn get_snippet(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    snippet_id: SnippetId,
) -> Result<Json<SnippetResponse>, AppError> {
    let row = state.snippets.get(ctx.user_id, snippet_id.id).await?;

    Ok(Json(row.into()))
}

pub async fn update_snippet(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    snippet_id: SnippetId,
    payload: Result<Json<SnippetRequest>, JsonRejection>,
) -> Result<Json<SnippetResponse>, AppError> {
    let fields = valid_fields(payload)?;
    let row = state
        .snippets
        .update(ctx.user_id, snippet_id.id, &fields)
        .await?;

    Ok(Json(row.into()))
}

pub async fn delete_snippet(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    snippet_id: SnippetId,
) -> Result<Json<SnippetResponse>, AppError> {
    let row = state.snippets.delete(ctx.user_id, snippet_id.id).await?;

    Ok(Json(row.into()))
}
