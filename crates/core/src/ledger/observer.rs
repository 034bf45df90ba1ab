//! Structured outcome reporting for ledger operations.

use std::sync::{Mutex, PoisonError};

use fintrack_shared::types::{TransactionId, UserId};

use super::error::ErrorKind;

/// The engine operation an event describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOperation {
    /// `CreateTransaction`.
    CreateTransaction,
    /// `UpdateTransaction`.
    UpdateTransaction,
    /// `DeleteTransaction`.
    DeleteTransaction,
}

impl LedgerOperation {
    /// Stable name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateTransaction => "create_transaction",
            Self::UpdateTransaction => "update_transaction",
            Self::DeleteTransaction => "delete_transaction",
        }
    }
}

/// How an operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The unit of work committed.
    Committed,
    /// The operation failed and nothing was written.
    Failed(ErrorKind),
}

/// One finished engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
    /// What was attempted.
    pub operation: LedgerOperation,
    /// On whose behalf.
    pub owner: UserId,
    /// The transaction, when known.
    pub transaction_id: Option<TransactionId>,
    /// How it ended.
    pub outcome: Outcome,
}

/// Receives one event per finished engine operation, success or failure.
pub trait LedgerObserver: Send + Sync {
    /// Called after the operation has finished.
    fn observe(&self, event: &LedgerEvent);
}

/// Observer that writes `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl LedgerObserver for TracingObserver {
    fn observe(&self, event: &LedgerEvent) {
        let transaction_id = event.transaction_id.map(|id| id.to_string()).unwrap_or_default();
        match event.outcome {
            Outcome::Committed => tracing::info!(
                operation = event.operation.as_str(),
                user_id = %event.owner,
                transaction_id = %transaction_id,
                "Ledger operation committed"
            ),
            Outcome::Failed(kind @ (ErrorKind::Storage | ErrorKind::DeadlineExceeded)) => tracing::error!(
                operation = event.operation.as_str(),
                user_id = %event.owner,
                transaction_id = %transaction_id,
                error_kind = kind.as_str(),
                "Ledger operation failed"
            ),
            Outcome::Failed(kind) => tracing::warn!(
                operation = event.operation.as_str(),
                user_id = %event.owner,
                transaction_id = %transaction_id,
                error_kind = kind.as_str(),
                "Ledger operation rejected"
            ),
        }
    }
}

/// Observer that records events in memory.
#[derive(Debug, Default)]
pub struct MemoryObserver {
    events: Mutex<Vec<LedgerEvent>>,
}

impl MemoryObserver {
    /// Creates an empty observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events seen so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LedgerObserver for MemoryObserver {
    fn observe(&self, event: &LedgerEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
