//! Audit log read routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use fintrack_shared::types::{PageRequest, query::parse_in_range};
use serde::Deserialize;
use serde_json::json;

use super::stats::{DAYS_DEFAULT, DAYS_RANGE};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the audit log routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/logs", get(list_logs))
        .route("/logs/stats", get(log_stats))
}

/// Query parameters for the audit log.
#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    /// Page size.
    pub limit: Option<String>,
    /// Rows to skip.
    pub offset: Option<String>,
    /// Window for activity counts.
    pub days: Option<String>,
}

/// GET `/logs?limit=&offset=` - The caller's audit entries, newest first.
async fn list_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = PageRequest::from_query(query.limit.as_deref(), query.offset.as_deref());
    let logs = state.audit_log.list_user_logs(auth.user_id(), page).await?;
    Ok(Json(json!({
        "logs": logs.data,
        "meta": logs.meta,
    })))
}

/// GET `/logs/stats?days=` - Entry counts per action and entity.
async fn log_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<LogsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let days = parse_in_range(query.days.as_deref(), DAYS_RANGE, DAYS_DEFAULT);
    let activity = state.audit_log.log_stats(auth.user_id(), days).await?;
    let total: i64 = activity.iter().map(|a| a.count).sum();
    Ok(Json(json!({
        "days": days,
        "total": total,
        "activity": activity,
    })))
}
