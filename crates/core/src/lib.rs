//! Core ledger logic for FinTrack.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Transaction polarity, balance effects, update planning, errors
//! - `audit` - Audit entries, change sets, and the sink contract
//! - `stats` - Read-model projections (summaries, rollups, forecasts)

pub mod audit;
pub mod ledger;
pub mod stats;
