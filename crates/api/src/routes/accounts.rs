//! Account management routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use fintrack_db::repositories::{CreateAccountInput, UpdateAccountInput};
use fintrack_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    AppState,
    error::ApiError,
    extractors::{IdPath, ValidatedJson},
    middleware::AuthUser,
};

/// Creates the account routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route(
            "/accounts/{id}",
            get(get_account).put(update_account).delete(delete_account),
        )
        .route("/accounts/{id}/default", post(set_default_account))
        .route("/accounts/{id}/stats", get(get_account_stats))
}

/// Request body for creating an account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Account name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Opening balance; zero when absent.
    pub balance: Option<Decimal>,
    /// Make this the default account.
    #[serde(default)]
    pub is_default: bool,
}

/// Request body for editing an account. Absent fields stay unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    /// New name.
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// Balance set directly, outside the transaction engine.
    pub balance: Option<Decimal>,
}

/// GET `/accounts` - List accounts, default first.
async fn list_accounts(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let accounts = state.accounts.list_accounts(auth.user_id()).await?;
    Ok(Json(json!({
        "count": accounts.len(),
        "accounts": accounts,
    })))
}

/// POST `/accounts` - Create an account.
async fn create_account(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateAccountInput {
        name: payload.name,
        balance: payload.balance,
        is_default: payload.is_default,
    };
    let account = state.accounts.create_account(auth.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(json!({ "account": account }))))
}

/// GET `/accounts/{id}` - Get account detail.
async fn get_account(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.accounts.get_account(auth.user_id(), id).await?;
    Ok(Json(json!({ "account": account })))
}

/// PUT `/accounts/{id}` - Rename an account or correct its balance.
async fn update_account(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<AccountId>,
    ValidatedJson(payload): ValidatedJson<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateAccountInput {
        name: payload.name,
        balance: payload.balance,
    };
    let account = state.accounts.update_account(auth.user_id(), id, input).await?;
    Ok(Json(json!({ "account": account })))
}

/// DELETE `/accounts/{id}` - Delete an account without transactions.
async fn delete_account(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    state.accounts.delete_account(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/accounts/{id}/default` - Make an account the default.
async fn set_default_account(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.accounts.set_default_account(auth.user_id(), id).await?;
    Ok(Json(json!({ "account": account })))
}

/// GET `/accounts/{id}/stats` - Balance and totals for one account.
async fn get_account_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<AccountId>,
) -> Result<impl IntoResponse, ApiError> {
    let stats = state.accounts.account_stats(auth.user_id(), id).await?;
    Ok(Json(stats))
}
