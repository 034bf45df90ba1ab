//! Audit sinks.

use std::sync::{Mutex, PoisonError};

use super::entry::AuditEntry;

/// Destination for audit entries.
///
/// `submit` must return promptly and must not fail; implementations that can
/// lose entries log the loss themselves.
pub trait AuditSink: Send + Sync {
    /// Hands an entry to the sink.
    fn submit(&self, entry: AuditEntry);
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn submit(&self, _entry: AuditEntry) {}
}

/// Sink that keeps entries in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything submitted so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn submit(&self, entry: AuditEntry) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}
