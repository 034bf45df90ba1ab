//! Projection types.

use std::fmt;

use chrono::{Days, Months, NaiveDate};
use fintrack_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::Polarity;

/// The slice of a transaction every projection needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerRow {
    /// Value date.
    pub value_date: NaiveDate,
    /// Income or expense.
    pub polarity: Polarity,
    /// Positive amount.
    pub amount: Decimal,
}

impl LedgerRow {
    /// Signed effect on the balance.
    #[must_use]
    pub fn signed(&self) -> Decimal {
        self.polarity.signed(self.amount)
    }
}

/// Totals over everything a user owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Sum of all account balances.
    pub total_balance: Decimal,
    /// Number of accounts.
    pub accounts_count: u64,
    /// Sum of income amounts.
    pub total_income: Decimal,
    /// Sum of expense amounts.
    pub total_expense: Decimal,
    /// Number of transactions.
    pub transactions_count: u64,
}

/// Income and expense of one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStats {
    /// `YYYY-MM`.
    pub month: String,
    /// Calendar year.
    pub year: i32,
    /// Income total.
    pub income: Decimal,
    /// Expense total.
    pub expense: Decimal,
    /// `income - expense`.
    pub balance: Decimal,
    /// Number of transactions in the month.
    pub transactions: u64,
}

/// One day of balance history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBalance {
    /// The day.
    pub date: NaiveDate,
    /// Income on that day.
    pub income: Decimal,
    /// Expense on that day.
    pub expense: Decimal,
    /// Total balance at the end of that day.
    pub balance: Decimal,
}

/// Aggregated amount of one category, before shares are computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTotal {
    /// Category name.
    pub name: String,
    /// Display color.
    pub color: String,
    /// Display icon.
    pub icon: String,
    /// Sum of amounts.
    pub amount: Decimal,
    /// Number of transactions.
    pub count: u64,
}

/// One category's share of a breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryShare {
    /// Category name.
    pub name: String,
    /// Display color.
    pub color: String,
    /// Display icon.
    pub icon: String,
    /// Sum of amounts.
    pub amount: Decimal,
    /// Number of transactions.
    pub count: u64,
    /// Share of the breakdown total, in percent with two decimals.
    pub percentage: Decimal,
}

/// Spending or earning per category over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Categories, largest amount first.
    pub categories: Vec<CategoryShare>,
    /// Sum over all categories.
    pub total: Decimal,
    /// The period covered.
    pub period: Period,
    /// Income or expense.
    #[serde(rename = "type")]
    pub polarity: Polarity,
}

/// One day of a trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// The day.
    pub date: NaiveDate,
    /// Income on that day.
    pub income: Decimal,
    /// Expense on that day.
    pub expense: Decimal,
    /// `income - expense`.
    pub net: Decimal,
}

/// Daily series with averages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trends {
    /// Window length in days.
    pub days: u32,
    /// One point per day, oldest first.
    pub points: Vec<TrendPoint>,
    /// Average daily income.
    pub average_income: Decimal,
    /// Average daily expense.
    pub average_expense: Decimal,
    /// Average daily net.
    pub average_net: Decimal,
}

/// Projected income and expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forecast {
    /// Number of months projected.
    pub months: u32,
    /// Projected income over `months`.
    pub predicted_income: Decimal,
    /// Projected expense over `months`.
    pub predicted_expense: Decimal,
    /// `predicted_income - predicted_expense`.
    pub predicted_balance: Decimal,
    /// Confidence in percent.
    pub confidence: u8,
    /// How many months of history the projection uses.
    pub based_on_months: usize,
}

/// Per-account totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStats {
    /// The account.
    pub account_id: AccountId,
    /// Current balance.
    pub balance: Decimal,
    /// Sum of income on the account.
    pub total_income: Decimal,
    /// Sum of expense on the account.
    pub total_expense: Decimal,
    /// Number of transactions on the account.
    pub transactions_count: u64,
}

/// Look-back window for category breakdowns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Last 7 days.
    Week,
    /// Last month.
    #[default]
    Month,
    /// Last year.
    Year,
}

impl Period {
    /// Parses a query value; anything unrecognized falls back to `Month`.
    #[must_use]
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("week") => Self::Week,
            Some("year") => Self::Year,
            _ => Self::Month,
        }
    }

    /// First day included when looking back from `today`.
    #[must_use]
    pub fn start(self, today: NaiveDate) -> NaiveDate {
        let start = match self {
            Self::Week => today.checked_sub_days(Days::new(7)),
            Self::Month => today.checked_sub_months(Months::new(1)),
            Self::Year => today.checked_sub_months(Months::new(12)),
        };
        start.unwrap_or(NaiveDate::MIN)
    }

    /// Query value of this period.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("week"), Period::Week)]
    #[case(Some("year"), Period::Year)]
    #[case(Some("month"), Period::Month)]
    #[case(Some("decade"), Period::Month)]
    #[case(None, Period::Month)]
    fn test_parse_lenient(#[case] raw: Option<&str>, #[case] expected: Period) {
        assert_eq!(Period::parse_lenient(raw), expected);
    }

    #[test]
    fn test_period_start() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        assert_eq!(Period::Week.start(today), NaiveDate::from_ymd_opt(2024, 3, 24).unwrap());
        assert_eq!(Period::Month.start(today), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(Period::Year.start(today), NaiveDate::from_ymd_opt(2023, 3, 31).unwrap());
    }
}
