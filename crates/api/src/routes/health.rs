//! Liveness check. Public; does not touch the database.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` while the process serves requests.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Public routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/health",
        get(|| async {
            Json(HealthResponse {
                status: "healthy",
                service: "fintrack-ledger",
                version: env!("CARGO_PKG_VERSION"),
            })
        }),
    )
}
