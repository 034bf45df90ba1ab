//! Background audit queue.
//!
//! Request handlers hand entries to an [`AuditDispatcher`], which never
//! blocks: when the bounded queue is full or the worker is gone the entry is
//! dropped with a warning. An [`AuditWorker`] drains the queue into the
//! `user_actions` table.

use fintrack_core::audit::{AuditEntry, AuditSink};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::repositories::AuditRepository;

/// Non-blocking [`AuditSink`] backed by a bounded channel.
#[derive(Debug, Clone)]
pub struct AuditDispatcher {
    sender: mpsc::Sender<AuditEntry>,
}

impl AuditDispatcher {
    /// Creates a dispatcher and the receiving end of its queue.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AuditEntry>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl AuditSink for AuditDispatcher {
    fn submit(&self, entry: AuditEntry) {
        match self.sender.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => tracing::warn!(
                user_id = %entry.actor,
                action = entry.action.as_str(),
                entity = entry.entity.as_str(),
                entity_id = %entry.entity_id,
                "Audit queue full, entry dropped"
            ),
            Err(TrySendError::Closed(entry)) => tracing::warn!(
                user_id = %entry.actor,
                action = entry.action.as_str(),
                entity = entry.entity.as_str(),
                entity_id = %entry.entity_id,
                "Audit queue closed, entry dropped"
            ),
        }
    }
}

/// Drains the audit queue into storage.
#[derive(Debug)]
pub struct AuditWorker {
    receiver: mpsc::Receiver<AuditEntry>,
    repo: AuditRepository,
}

impl AuditWorker {
    /// Creates a worker writing through `repo`.
    #[must_use]
    pub const fn new(receiver: mpsc::Receiver<AuditEntry>, repo: AuditRepository) -> Self {
        Self { receiver, repo }
    }

    /// Runs until every dispatcher has been dropped and the queue is empty.
    ///
    /// Returns the number of entries written.
    pub async fn run(mut self) -> u64 {
        let mut written = 0;
        while let Some(entry) = self.receiver.recv().await {
            match self.repo.append(&entry).await {
                Ok(()) => written += 1,
                Err(e) => tracing::error!(
                    user_id = %entry.actor,
                    action = entry.action.as_str(),
                    entity = entry.entity.as_str(),
                    entity_id = %entry.entity_id,
                    error = %e,
                    "Failed to write audit entry"
                ),
            }
        }
        tracing::info!(written, "Audit worker stopped");
        written
    }
}
