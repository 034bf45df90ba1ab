//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Bearer token authentication middleware
//! - Request extractors and the JSON error envelope

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use fintrack_core::audit::AuditSink;
use fintrack_core::ledger::LedgerObserver;
use fintrack_db::{
    AccountRepository, AuditRepository, CategoryRepository, StatsRepository,
    TransactionRepository,
};
use fintrack_shared::JwtService;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// JWT service for token verification.
    pub jwt_service: Arc<JwtService>,
    /// Account ledger store.
    pub accounts: AccountRepository,
    /// Category registry.
    pub categories: CategoryRepository,
    /// Transaction engine.
    pub transactions: TransactionRepository,
    /// Audit log reads.
    pub audit_log: AuditRepository,
    /// Read-model projections.
    pub stats: StatsRepository,
}

impl AppState {
    /// Wires every repository to one connection pool, audit sink and observer.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        jwt_service: JwtService,
        audit: Arc<dyn AuditSink>,
        observer: Arc<dyn LedgerObserver>,
        unit_of_work_timeout: Duration,
    ) -> Self {
        Self {
            jwt_service: Arc::new(jwt_service),
            accounts: AccountRepository::new(db.clone(), audit.clone()),
            categories: CategoryRepository::new(db.clone(), audit.clone()),
            transactions: TransactionRepository::new(db.clone(), audit, observer)
                .with_deadline(unit_of_work_timeout),
            audit_log: AuditRepository::new(db.clone()),
            stats: StatsRepository::new(db),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
