//! Transaction routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use fintrack_core::ledger::{
    CreateTransactionInput, Polarity, TransactionFilter, UpdateTransactionInput,
};
use fintrack_db::entities::transactions;
use fintrack_db::repositories::TransactionWithNames;
use fintrack_shared::types::{AccountId, CategoryId, PageRequest, TransactionId, query::parse_opt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    error::ApiError,
    extractors::{IdPath, ValidatedJson},
    middleware::AuthUser,
};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/{id}",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for listing transactions.
///
/// Kept as raw strings: anything malformed is ignored, never rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ListTransactionsQuery {
    /// Filter by account.
    pub account_id: Option<String>,
    /// Filter by category.
    pub category_id: Option<String>,
    /// Filter by polarity (`income` or `expense`).
    #[serde(rename = "type")]
    pub polarity: Option<String>,
    /// Earliest value date, inclusive (YYYY-MM-DD).
    pub date_from: Option<String>,
    /// Latest value date, inclusive (YYYY-MM-DD).
    pub date_to: Option<String>,
    /// Page size.
    pub limit: Option<String>,
    /// Rows to skip.
    pub offset: Option<String>,
}

impl ListTransactionsQuery {
    fn filter(&self) -> TransactionFilter {
        TransactionFilter {
            account_id: parse_opt(self.account_id.as_deref()),
            category_id: parse_opt(self.category_id.as_deref()),
            polarity: parse_opt::<Polarity>(self.polarity.as_deref()),
            date_from: parse_opt(self.date_from.as_deref()),
            date_to: parse_opt(self.date_to.as_deref()),
        }
    }

    fn page(&self) -> PageRequest {
        PageRequest::from_query(self.limit.as_deref(), self.offset.as_deref())
    }
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTransactionRequest {
    /// Account the transaction is booked against.
    pub account_id: AccountId,
    /// Category; decides the polarity.
    pub category_id: CategoryId,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Free text.
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: String,
    /// Value date (YYYY-MM-DD); today when absent or blank.
    pub date: Option<String>,
}

/// Request body for updating a transaction. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTransactionRequest {
    /// New account.
    pub account_id: Option<AccountId>,
    /// New category.
    pub category_id: Option<CategoryId>,
    /// New amount.
    pub amount: Option<Decimal>,
    /// New description.
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    /// New value date (YYYY-MM-DD).
    pub date: Option<String>,
}

/// Response for a transaction.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: Uuid,
    /// Account ID.
    pub account_id: Uuid,
    /// Category ID.
    pub category_id: Uuid,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub polarity: Polarity,
    /// Amount, always positive.
    pub amount: Decimal,
    /// Description.
    pub description: String,
    /// Value date.
    pub date: NaiveDate,
    /// Created at timestamp.
    pub created_at: DateTime<FixedOffset>,
    /// Updated at timestamp.
    pub updated_at: DateTime<FixedOffset>,
    /// Account name (list responses only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    /// Category name (list responses only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Category icon (list responses only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_icon: Option<String>,
    /// Category color (list responses only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_color: Option<String>,
}

impl From<transactions::Model> for TransactionResponse {
    fn from(t: transactions::Model) -> Self {
        Self {
            id: t.id,
            account_id: t.account_id,
            category_id: t.category_id,
            polarity: t.transaction_type.into(),
            amount: t.amount,
            description: t.description,
            date: t.value_date,
            created_at: t.created_at,
            updated_at: t.updated_at,
            account_name: None,
            category_name: None,
            category_icon: None,
            category_color: None,
        }
    }
}

impl From<TransactionWithNames> for TransactionResponse {
    fn from(row: TransactionWithNames) -> Self {
        Self {
            account_name: Some(row.account_name),
            category_name: Some(row.category_name),
            category_icon: Some(row.category_icon),
            category_color: Some(row.category_color),
            ..Self::from(row.transaction)
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/transactions` - List transactions, newest value date first.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .transactions
        .list_transactions(auth.user_id(), query.filter(), query.page())
        .await?
        .map(TransactionResponse::from);

    Ok(Json(json!({
        "transactions": page.data,
        "meta": page.meta,
    })))
}

/// POST `/transactions` - Record a transaction.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = CreateTransactionInput {
        account_id: payload.account_id,
        category_id: payload.category_id,
        amount: payload.amount,
        description: payload.description,
        value_date: payload.date,
    };
    let transaction = state
        .transactions
        .create_transaction(auth.user_id(), input)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "transaction": TransactionResponse::from(transaction) })),
    ))
}

/// GET `/transactions/{id}` - Get one transaction.
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<TransactionId>,
) -> Result<impl IntoResponse, ApiError> {
    let transaction = state.transactions.get_transaction(auth.user_id(), id).await?;
    Ok(Json(json!({ "transaction": TransactionResponse::from(transaction) })))
}

/// PUT `/transactions/{id}` - Update a transaction.
async fn update_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<TransactionId>,
    ValidatedJson(payload): ValidatedJson<UpdateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateTransactionInput {
        account_id: payload.account_id,
        category_id: payload.category_id,
        amount: payload.amount,
        description: payload.description,
        value_date: payload.date,
    };
    let transaction = state
        .transactions
        .update_transaction(auth.user_id(), id, input)
        .await?;

    Ok(Json(json!({ "transaction": TransactionResponse::from(transaction) })))
}

/// DELETE `/transactions/{id}` - Delete a transaction and reverse its effect.
async fn delete_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    IdPath(id): IdPath<TransactionId>,
) -> Result<impl IntoResponse, ApiError> {
    state.transactions.delete_transaction(auth.user_id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
