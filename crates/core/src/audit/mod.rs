//! Audit log domain.
//!
//! Entries describe what a user changed. They are produced by the ledger and
//! handed to an [`AuditSink`] after the owning unit of work commits; a sink
//! never reports failure back to the producer.

mod changes;
mod entry;
mod sink;

pub use changes::{ChangeSet, FieldChange};
pub use entry::{AuditAction, AuditEntry, EntityKind};
pub use sink::{AuditSink, MemoryAuditSink, NoopAuditSink};
