//! Seeds the shared system categories.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(SEED_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DELETE FROM categories WHERE is_system;")
            .await?;
        Ok(())
    }
}

const SEED_SQL: &str = r"
INSERT INTO categories (id, user_id, name, type, icon, color, is_system) VALUES
    (gen_random_uuid(), NULL, 'Salary',        'income',  'briefcase',     '#4CAF50', true),
    (gen_random_uuid(), NULL, 'Freelance',     'income',  'laptop',        '#8BC34A', true),
    (gen_random_uuid(), NULL, 'Investments',   'income',  'trending-up',   '#009688', true),
    (gen_random_uuid(), NULL, 'Gifts',         'income',  'gift',          '#CDDC39', true),
    (gen_random_uuid(), NULL, 'Other Income',  'income',  'plus-circle',   '#607D8B', true),
    (gen_random_uuid(), NULL, 'Food',          'expense', 'shopping-cart', '#F44336', true),
    (gen_random_uuid(), NULL, 'Transport',     'expense', 'car',           '#FF9800', true),
    (gen_random_uuid(), NULL, 'Housing',       'expense', 'home',          '#795548', true),
    (gen_random_uuid(), NULL, 'Utilities',     'expense', 'zap',           '#FFC107', true),
    (gen_random_uuid(), NULL, 'Entertainment', 'expense', 'film',          '#9C27B0', true),
    (gen_random_uuid(), NULL, 'Healthcare',    'expense', 'heart',         '#E91E63', true),
    (gen_random_uuid(), NULL, 'Shopping',      'expense', 'shopping-bag',  '#3F51B5', true),
    (gen_random_uuid(), NULL, 'Education',     'expense', 'book',          '#2196F3', true),
    (gen_random_uuid(), NULL, 'Other Expense', 'expense', 'more-horizontal', '#9E9E9E', true)
ON CONFLICT DO NOTHING;
";
