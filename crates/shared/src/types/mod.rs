//! Common types used across the application.

pub mod id;
pub mod pagination;
pub mod query;

pub use id::*;
pub use pagination::{PageMeta, PageRequest, PageResponse};
