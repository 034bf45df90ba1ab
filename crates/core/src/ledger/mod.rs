//! Transaction ledger logic.
//!
//! This module implements the rules behind every balance mutation:
//! - Polarity and the signed effect of a transaction
//! - Balance deltas, reversals, and lock ordering
//! - Input validation (amounts, value dates)
//! - Update planning (merge, diff, reverse-then-apply)
//! - Error taxonomy for ledger operations
//! - Structured observability events

pub mod balance;
pub mod error;
pub mod observer;
pub mod polarity;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use balance::{BalanceDelta, RunningBalance, lock_order};
pub use error::{ErrorKind, LedgerError};
pub use observer::{
    LedgerEvent, LedgerObserver, LedgerOperation, MemoryObserver, Outcome, TracingObserver,
};
pub use polarity::Polarity;
pub use service::{LedgerService, UpdatePlan};
pub use types::{
    CreateTransactionInput, NewTransaction, TransactionFilter, TransactionPatch,
    TransactionRecord, UpdateTransactionInput,
};
