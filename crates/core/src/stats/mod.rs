//! Read-model projections.
//!
//! Aggregates are computed on demand from committed ledger rows. The storage
//! layer loads rows; everything arithmetic happens here, in `Decimal`.

mod overview;
mod service;
mod types;

pub use overview::{
    AccountBalance, AccountSnapshot, CategoryActivity, CategoryStat, Comparison, Insight,
    InsightInputs, InsightKind, InsightPriority, Overview, OverviewPeriod, PeriodTotals,
    TOP_CATEGORIES_LIMIT,
};
pub use service::{FORECAST_LOOKBACK_MONTHS, StatsService};
pub use types::{
    AccountStats, CategoryBreakdown, CategoryShare, CategoryTotal, DailyBalance, Forecast,
    LedgerRow, MonthlyStats, Period, Summary, TrendPoint, Trends,
};
