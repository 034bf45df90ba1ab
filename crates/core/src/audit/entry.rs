//! Audit entry types.

use std::fmt;

use chrono::{DateTime, Utc};
use fintrack_shared::types::{AuditEntryId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use super::changes::ChangeSet;

/// What kind of change was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// An entity was created.
    Create,
    /// An entity was modified.
    Update,
    /// An entity was removed.
    Delete,
}

impl AuditAction {
    /// Stored name of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Past-tense verb used inside `details`.
    #[must_use]
    pub const fn past_tense(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of entity an entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// An account.
    Account,
    /// A category.
    Category,
    /// A transaction.
    Transaction,
}

impl EntityKind {
    /// Stored name of the entity kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Account => "account",
            Self::Category => "category",
            Self::Transaction => "transaction",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry ID.
    pub id: AuditEntryId,
    /// The user who made the change.
    pub actor: UserId,
    /// Create, update or delete.
    pub action: AuditAction,
    /// Kind of the changed entity.
    pub entity: EntityKind,
    /// ID of the changed entity.
    pub entity_id: Uuid,
    /// Structured description of the change.
    pub details: Value,
    /// When the change committed.
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    fn new(actor: UserId, action: AuditAction, entity: EntityKind, entity_id: Uuid, details: Value) -> Self {
        Self {
            id: AuditEntryId::new(),
            actor,
            action,
            entity,
            entity_id,
            details,
            recorded_at: Utc::now(),
        }
    }

    /// Entry for a newly created entity, carrying its snapshot.
    #[must_use]
    pub fn created(actor: UserId, entity: EntityKind, entity_id: Uuid, snapshot: Value) -> Self {
        let details = json!({ "action": AuditAction::Create.past_tense(), "data": snapshot });
        Self::new(actor, AuditAction::Create, entity, entity_id, details)
    }

    /// Entry for a removed entity, carrying its last snapshot.
    #[must_use]
    pub fn deleted(actor: UserId, entity: EntityKind, entity_id: Uuid, snapshot: Value) -> Self {
        let details = json!({ "action": AuditAction::Delete.past_tense(), "data": snapshot });
        Self::new(actor, AuditAction::Delete, entity, entity_id, details)
    }

    /// Entry for a modified entity. Returns `None` when nothing changed.
    #[must_use]
    pub fn updated(actor: UserId, entity: EntityKind, entity_id: Uuid, changes: &ChangeSet) -> Option<Self> {
        if changes.is_empty() {
            return None;
        }
        let details = json!({
            "action": AuditAction::Update.past_tense(),
            "changes": changes.to_json(),
        });
        Some(Self::new(actor, AuditAction::Update, entity, entity_id, details))
    }
}
