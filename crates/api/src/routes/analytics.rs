//! Analytics routes: overview, insights, daily trends and a simple forecast.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use fintrack_core::stats::OverviewPeriod;
use fintrack_shared::types::query::parse_in_range;
use serde::Deserialize;

use super::stats::{DAYS_DEFAULT, DAYS_RANGE};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Months projected when the caller does not say.
pub const FORECAST_MONTHS_DEFAULT: u32 = 3;

/// Creates the analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/overview", get(overview))
        .route("/analytics/insights", get(insights))
        .route("/analytics/trends", get(trends))
        .route("/analytics/forecast", get(forecast))
}

/// Query parameters for analytics endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// Trend window in days.
    pub days: Option<String>,
    /// Months to project.
    pub months: Option<String>,
    /// Overview window: `week`, `month`, `quarter` or `year`.
    pub period: Option<String>,
}

impl AnalyticsQuery {
    fn days(&self) -> u32 {
        parse_in_range(self.days.as_deref(), DAYS_RANGE, DAYS_DEFAULT)
    }

    fn months(&self) -> u32 {
        parse_in_range(self.months.as_deref(), 1..=24, FORECAST_MONTHS_DEFAULT)
    }

    fn period(&self) -> OverviewPeriod {
        OverviewPeriod::parse_lenient(self.period.as_deref())
    }
}

/// GET `/analytics/overview?period=` - Totals, top categories and account split.
async fn overview(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let overview = state.stats.overview(auth.user_id(), query.period()).await?;
    Ok(Json(overview))
}

/// GET `/analytics/insights` - Observations about the current month.
async fn insights(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let insights = state.stats.insights(auth.user_id()).await?;
    Ok(Json(insights))
}

/// GET `/analytics/trends?days=` - Daily income, expense and net.
async fn trends(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let trends = state.stats.trends(auth.user_id(), query.days()).await?;
    Ok(Json(trends))
}

/// GET `/analytics/forecast?months=` - Projection from recent monthly averages.
async fn forecast(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let forecast = state.stats.forecast(auth.user_id(), query.months()).await?;
    Ok(Json(forecast))
}
