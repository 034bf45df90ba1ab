//! Active enums stored as strings.

use fintrack_core::ledger::Polarity;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category (and denormalized transaction) type column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    /// Income.
    #[sea_orm(string_value = "income")]
    Income,
    /// Expense.
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl From<CategoryType> for Polarity {
    fn from(value: CategoryType) -> Self {
        match value {
            CategoryType::Income => Self::Income,
            CategoryType::Expense => Self::Expense,
        }
    }
}

impl From<Polarity> for CategoryType {
    fn from(value: Polarity) -> Self {
        match value {
            Polarity::Income => Self::Income,
            Polarity::Expense => Self::Expense,
        }
    }
}
