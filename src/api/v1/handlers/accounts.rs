/*
 * Responsibility
 * - register / login / account 削除 / password 変更 の handler
 * - 認証不要 (admission のみ)、本人確認は email + password で行う
 */
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};

use crate::{
    api::v1::dto::users::{
        ChangePasswordRequest, CredentialsRequest, DeletedAccountResponse, RegisterRequest,
        TokenResponse,
    },
    api::v1::handlers::json_body,
    error::AppError,
    state::AppState,
};

fn invalid(message: String) -> AppError {
    AppError::bad_request("INVALID_PAYLOAD", message)
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let req = json_body(payload)?;
    req.validate().map_err(invalid)?;

    let session = state.accounts.register(req.into_registration()).await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, AppError> {
    let req = json_body(payload)?;
    req.validate().map_err(invalid)?;

    let session = state.accounts.login(&req.email, &req.password).await?;

    Ok(Json(session.into()))
}

pub async fn delete_account(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<DeletedAccountResponse>, AppError> {
    let req = json_body(payload)?;
    req.validate().map_err(invalid)?;

    let user_id = state
        .accounts
        .delete_account(&req.email, &req.password)
        .await?;

    Ok(Json(DeletedAccountResponse { user_id }))
}

pub async fn change_password(
    State(state): State<AppState>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let req = json_body(payload)?;
    req.validate().map_err(invalid)?;

    state
        .accounts
        .change_password(&req.email, &req.password, &req.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
