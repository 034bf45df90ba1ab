//! FinTrack ledger API server.
//!
//! Main entry point for the ledger backend service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use fintrack_api::{AppState, create_router};
use fintrack_core::audit::AuditSink;
use fintrack_core::ledger::TracingObserver;
use fintrack_db::{AuditDispatcher, AuditRepository, AuditWorker, connect};
use fintrack_shared::config::LogConfig;
use fintrack_shared::{AppConfig, JwtConfig, JwtService};

/// How long shutdown waits for the audit queue to drain.
const AUDIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

fn init_tracing(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let (json, plain) = if log.json {
        (Some(fmt::layer().json()), None)
    } else {
        (None, Some(fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .init();
}

/// Resolves on Ctrl-C or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received terminate signal, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_tracing(&config.log);

    let db = connect(&config.database).await?;
    info!("Connected to database");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .unwrap_or(i64::MAX),
    });

    let (dispatcher, receiver) = AuditDispatcher::channel(config.audit.queue_capacity);
    let worker = tokio::spawn(AuditWorker::new(receiver, AuditRepository::new(db.clone())).run());
    let audit: Arc<dyn AuditSink> = Arc::new(dispatcher);

    let state = AppState::new(
        db,
        jwt_service,
        audit,
        Arc::new(TracingObserver),
        config.ledger.unit_of_work_timeout(),
    );
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        %addr,
        unit_of_work_timeout_ms = config.ledger.unit_of_work_timeout_ms,
        audit_queue_capacity = config.audit.queue_capacity,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and with it every audit sender) is gone; let the worker
    // write what is still queued.
    match tokio::time::timeout(AUDIT_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(written)) => info!(written, "Audit queue drained"),
        Ok(Err(e)) => error!(error = %e, "Audit worker panicked"),
        Err(_) => warn!("Audit queue not drained before timeout"),
    }

    Ok(())
}
