//! Read-model routes: summary, monthly rollups, balance history and
//! category breakdowns.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use fintrack_core::ledger::Polarity;
use fintrack_core::stats::Period;
use fintrack_shared::types::query::{parse_in_range, parse_opt};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Default and allowed range of `months` for monthly stats.
pub const MONTHS_DEFAULT: u32 = 12;
const MONTHS_RANGE: std::ops::RangeInclusive<u32> = 1..=60;

/// Default and allowed range of `days` for day-based windows.
pub const DAYS_DEFAULT: u32 = 30;
pub(crate) const DAYS_RANGE: std::ops::RangeInclusive<u32> = 1..=365;

/// Creates the stats routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stats/summary", get(summary))
        .route("/stats/monthly", get(monthly))
        .route("/stats/balance-history", get(balance_history))
        .route("/stats/categories", get(category_breakdown))
}

/// Query parameters shared by the stats endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    /// Number of months to cover.
    pub months: Option<String>,
    /// Number of days to cover.
    pub days: Option<String>,
    /// `income` or `expense`.
    #[serde(rename = "type")]
    pub polarity: Option<String>,
    /// `week`, `month` or `year`.
    pub period: Option<String>,
}

impl StatsQuery {
    fn months(&self) -> u32 {
        parse_in_range(self.months.as_deref(), MONTHS_RANGE, MONTHS_DEFAULT)
    }

    fn days(&self) -> u32 {
        parse_in_range(self.days.as_deref(), DAYS_RANGE, DAYS_DEFAULT)
    }

    fn polarity(&self) -> Polarity {
        parse_opt(self.polarity.as_deref()).unwrap_or(Polarity::Expense)
    }
}

/// GET `/stats/summary` - Totals across all accounts.
async fn summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let summary = state.stats.summary(auth.user_id()).await?;
    Ok(Json(summary))
}

/// GET `/stats/monthly?months=` - Per-month income and expense, newest first.
async fn monthly(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let months = query.months();
    let stats = state.stats.monthly(auth.user_id(), months).await?;
    Ok(Json(json!({ "months": months, "stats": stats })))
}

/// GET `/stats/balance-history?days=` - Daily running balance.
async fn balance_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = query.days();
    let history = state.stats.balance_history(auth.user_id(), days).await?;
    Ok(Json(json!({ "days": days, "history": history })))
}

/// GET `/stats/categories?type=&period=` - Amount per category.
async fn category_breakdown(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let breakdown = state
        .stats
        .category_breakdown(
            auth.user_id(),
            query.polarity(),
            Period::parse_lenient(query.period.as_deref()),
        )
        .await?;
    Ok(Json(breakdown))
}
