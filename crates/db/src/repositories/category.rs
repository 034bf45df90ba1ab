//! Category repository.
//!
//! A caller sees their own categories plus the system ones. System
//! categories are read-only; a category's type never changes after creation.

use std::sync::Arc;

use chrono::Utc;
use fintrack_core::audit::{AuditEntry, AuditSink, ChangeSet, EntityKind};
use fintrack_core::ledger::validation::validate_name;
use fintrack_core::ledger::{LedgerError, Polarity};
use fintrack_shared::types::{CategoryId, UserId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use serde_json::{Value, json};

use crate::entities::{categories, sea_orm_active_enums::CategoryType, transactions};
use crate::error::StoreError;

/// Input for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryInput {
    /// Display name, unique per owner and type.
    pub name: String,
    /// Income or expense; fixed for the category's lifetime.
    pub polarity: Polarity,
    /// Display icon.
    pub icon: String,
    /// Display color.
    pub color: String,
}

/// Input for editing a category. Blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryInput {
    /// New name.
    pub name: Option<String>,
    /// New icon.
    pub icon: Option<String>,
    /// New color.
    pub color: Option<String>,
}

fn snapshot(category: &categories::Model) -> Value {
    json!({
        "id": category.id,
        "name": category.name,
        "type": category.category_type,
        "icon": category.icon,
        "color": category.color,
    })
}

/// Own categories plus the system ones.
fn visible_to(owner: UserId) -> Condition {
    Condition::any()
        .add(categories::Column::UserId.eq(owner.into_inner()))
        .add(categories::Column::IsSystem.eq(true))
}

fn duplicate(name: &str, polarity: CategoryType) -> LedgerError {
    LedgerError::DuplicateCategory {
        name: name.to_string(),
        polarity: Polarity::from(polarity).to_string(),
    }
}

/// Maps a unique-index violation to a duplicate-name conflict.
fn map_unique(err: DbErr, name: &str, polarity: CategoryType) -> StoreError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        duplicate(name, polarity).into()
    } else {
        err.into()
    }
}

/// Category repository.
#[derive(Clone)]
pub struct CategoryRepository {
    db: DatabaseConnection,
    audit: Arc<dyn AuditSink>,
}

impl CategoryRepository {
    /// Creates a new category repository.
    #[must_use]
    pub fn new(db: DatabaseConnection, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    /// Lists own and system categories: system first, then by type and name.
    pub async fn list_categories(
        &self,
        owner: UserId,
        polarity: Option<Polarity>,
    ) -> Result<Vec<categories::Model>, LedgerError> {
        let mut query = categories::Entity::find().filter(visible_to(owner));
        if let Some(polarity) = polarity {
            query = query.filter(categories::Column::CategoryType.eq(CategoryType::from(polarity)));
        }

        let categories = query
            .order_by_desc(categories::Column::IsSystem)
            .order_by_asc(categories::Column::CategoryType)
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await
            .map_err(StoreError::from)?;
        Ok(categories)
    }

    /// Gets an own or system category.
    pub async fn get_category(&self, owner: UserId, id: CategoryId) -> Result<categories::Model, LedgerError> {
        let category = categories::Entity::find_by_id(id.into_inner())
            .filter(visible_to(owner))
            .one(&self.db)
            .await
            .map_err(StoreError::from)?
            .ok_or(LedgerError::CategoryNotFound(id.into_inner()))?;
        Ok(category)
    }

    /// Creates a category owned by `owner`.
    pub async fn create_category(
        &self,
        owner: UserId,
        input: CreateCategoryInput,
    ) -> Result<categories::Model, LedgerError> {
        let name = validate_name(&input.name)?;
        let category_type = CategoryType::from(input.polarity);

        let category = self.insert_category(owner, name, category_type, input).await?;

        tracing::info!(
            user_id = %owner,
            category_id = %category.id,
            category_type = %Polarity::from(category.category_type),
            "Category created"
        );
        self.audit.submit(AuditEntry::created(
            owner,
            EntityKind::Category,
            category.id,
            snapshot(&category),
        ));
        Ok(category)
    }

    async fn insert_category(
        &self,
        owner: UserId,
        name: String,
        category_type: CategoryType,
        input: CreateCategoryInput,
    ) -> Result<categories::Model, StoreError> {
        if self.name_taken(owner, &name, category_type, None).await? {
            return Err(duplicate(&name, category_type).into());
        }

        categories::ActiveModel {
            id: Set(CategoryId::new().into_inner()),
            user_id: Set(Some(owner.into_inner())),
            name: Set(name.clone()),
            category_type: Set(category_type),
            icon: Set(input.icon.trim().to_string()),
            color: Set(input.color.trim().to_string()),
            is_system: Set(false),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| map_unique(e, &name, category_type))
    }

    /// Edits an owned category's name, icon or color.
    pub async fn update_category(
        &self,
        owner: UserId,
        id: CategoryId,
        input: UpdateCategoryInput,
    ) -> Result<categories::Model, LedgerError> {
        let name = non_blank(input.name).map(|n| validate_name(&n)).transpose()?;
        let icon = non_blank(input.icon);
        let color = non_blank(input.color);

        let current = self.owned_mutable(owner, id).await?;

        let requested_name = name.clone().unwrap_or_else(|| current.name.clone());
        let mut changes = ChangeSet::new();
        let mut active: categories::ActiveModel = current.clone().into();
        if let Some(name) = name {
            if changes.record("name", current.name.as_str(), name.as_str()) {
                if self
                    .name_taken(owner, &name, current.category_type, Some(current.id))
                    .await?
                {
                    return Err(duplicate(&name, current.category_type));
                }
                active.name = Set(name);
            }
        }
        if let Some(icon) = icon {
            if changes.record("icon", current.icon.as_str(), icon.as_str()) {
                active.icon = Set(icon);
            }
        }
        if let Some(color) = color {
            if changes.record("color", current.color.as_str(), color.as_str()) {
                active.color = Set(color);
            }
        }

        if changes.is_empty() {
            return Ok(current);
        }

        let category_type = current.category_type;
        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| map_unique(e, &requested_name, category_type))?;

        tracing::info!(
            user_id = %owner,
            category_id = %updated.id,
            changed = changes.len(),
            "Category updated"
        );
        if let Some(entry) = AuditEntry::updated(owner, EntityKind::Category, updated.id, &changes) {
            self.audit.submit(entry);
        }
        Ok(updated)
    }

    /// Deletes an owned category that no transaction references.
    pub async fn delete_category(&self, owner: UserId, id: CategoryId) -> Result<(), LedgerError> {
        let deleted = self.remove_category(owner, id).await?;

        tracing::info!(user_id = %owner, category_id = %deleted.id, "Category deleted");
        self.audit.submit(AuditEntry::deleted(
            owner,
            EntityKind::Category,
            deleted.id,
            snapshot(&deleted),
        ));
        Ok(())
    }

    async fn remove_category(&self, owner: UserId, id: CategoryId) -> Result<categories::Model, StoreError> {
        let txn = self.db.begin().await?;

        let category = categories::Entity::find_by_id(id.into_inner())
            .filter(visible_to(owner))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(LedgerError::CategoryNotFound(id.into_inner()))?;
        if category.is_system {
            return Err(LedgerError::SystemCategory.into());
        }

        let referencing = transactions::Entity::find()
            .filter(transactions::Column::CategoryId.eq(category.id))
            .count(&txn)
            .await?;
        if referencing > 0 {
            return Err(LedgerError::CategoryHasTransactions(referencing).into());
        }

        categories::Entity::delete_by_id(category.id).exec(&txn).await?;
        txn.commit().await?;
        Ok(category)
    }

    /// Reads the category's current type inside the caller's unit of work.
    ///
    /// Never cached: a type changed by an operator takes effect on the next
    /// write.
    pub(crate) async fn resolve_category_type(
        txn: &DatabaseTransaction,
        owner: UserId,
        id: CategoryId,
    ) -> Result<Polarity, StoreError> {
        let category_type: Option<CategoryType> = categories::Entity::find_by_id(id.into_inner())
            .filter(visible_to(owner))
            .select_only()
            .column(categories::Column::CategoryType)
            .into_tuple()
            .one(txn)
            .await?;

        category_type
            .map(Polarity::from)
            .ok_or_else(|| LedgerError::CategoryNotFound(id.into_inner()).into())
    }

    /// Loads a category the owner may modify.
    ///
    /// System categories fail with `SystemCategory`; anything the owner does
    /// not own is reported as missing.
    async fn owned_mutable(&self, owner: UserId, id: CategoryId) -> Result<categories::Model, LedgerError> {
        let category = categories::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(StoreError::from)?
            .ok_or(LedgerError::CategoryNotFound(id.into_inner()))?;

        if category.is_system {
            return Err(LedgerError::SystemCategory);
        }
        if category.user_id != Some(owner.into_inner()) {
            return Err(LedgerError::CategoryNotFound(id.into_inner()));
        }
        Ok(category)
    }

    async fn name_taken(
        &self,
        owner: UserId,
        name: &str,
        category_type: CategoryType,
        except: Option<uuid::Uuid>,
    ) -> Result<bool, StoreError> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(owner.into_inner()))
            .filter(categories::Column::CategoryType.eq(category_type))
            .filter(categories::Column::Name.eq(name));
        if let Some(except) = except {
            query = query.filter(categories::Column::Id.ne(except));
        }
        Ok(query.count(&self.db).await? > 0)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank_ignores_whitespace() {
        assert_eq!(non_blank(Some("  ".to_string())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" Food ".to_string())).as_deref(), Some("Food"));
    }

    #[test]
    fn test_unique_violation_maps_to_duplicate() {
        let err = map_unique(
            DbErr::Custom("unrelated".to_string()),
            "Food",
            CategoryType::Expense,
        );
        assert!(matches!(err, StoreError::Database(_)));

        let conflict = LedgerError::from(StoreError::from(duplicate("Food", CategoryType::Expense)));
        assert_eq!(
            conflict.to_string(),
            "Category 'Food' already exists for type expense"
        );
    }
}
