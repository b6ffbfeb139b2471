//! Result types for repository searches
//!
//! Read-only projections of the provider's repository data.

mod types;

pub use types::*;
