//! Audit log repository over the `user_actions` table.

use chrono::{Duration, Utc};
use fintrack_core::audit::AuditEntry;
use fintrack_shared::types::{PageRequest, PageResponse, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;

use crate::entities::user_actions;

/// Number of log entries per (action, entity) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditActivity {
    /// `create`, `update` or `delete`.
    pub action: String,
    /// `account`, `category` or `transaction`.
    pub entity: String,
    /// Number of entries.
    pub count: i64,
}

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Persists one entry.
    pub async fn append(&self, entry: &AuditEntry) -> Result<(), DbErr> {
        user_actions::ActiveModel {
            id: Set(entry.id.into_inner()),
            user_id: Set(entry.actor.into_inner()),
            action: Set(entry.action.as_str().to_string()),
            entity: Set(entry.entity.as_str().to_string()),
            entity_id: Set(entry.entity_id),
            details: Set(entry.details.clone()),
            created_at: Set(entry.recorded_at.into()),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }

    /// The owner's entries, newest first.
    pub async fn list_user_logs(
        &self,
        owner: UserId,
        page: PageRequest,
    ) -> Result<PageResponse<user_actions::Model>, DbErr> {
        let query = user_actions::Entity::find()
            .filter(user_actions::Column::UserId.eq(owner.into_inner()));

        let total = query.clone().count(&self.db).await?;
        let logs = query
            .order_by_desc(user_actions::Column::CreatedAt)
            .order_by_desc(user_actions::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(logs, page, total))
    }

    /// Entry counts per (action, entity) over the last `days` days.
    pub async fn log_stats(&self, owner: UserId, days: u32) -> Result<Vec<AuditActivity>, DbErr> {
        let since = Utc::now() - Duration::days(i64::from(days));

        let rows: Vec<(String, String, i64)> = user_actions::Entity::find()
            .select_only()
            .column(user_actions::Column::Action)
            .column(user_actions::Column::Entity)
            .column_as(user_actions::Column::Id.count(), "count")
            .filter(user_actions::Column::UserId.eq(owner.into_inner()))
            .filter(user_actions::Column::CreatedAt.gte(since))
            .group_by(user_actions::Column::Action)
            .group_by(user_actions::Column::Entity)
            .order_by_asc(user_actions::Column::Action)
            .order_by_asc(user_actions::Column::Entity)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(action, entity, count)| AuditActivity {
                action,
                entity,
                count,
            })
            .collect())
    }
}
