//! repo-finder: debounced, cached and cancellable repository search
//!
//! Turns a free-text term and/or a language filter into GitHub repository
//! searches. The `search` module holds the orchestration core; the other
//! modules are the collaborators it talks to.

pub mod cache;
pub mod config;
pub mod metrics;
pub mod network;
pub mod preferences;
pub mod provider;
pub mod query;
pub mod render;
pub mod results;
pub mod search;

pub use config::Settings;
pub use provider::RepositoryProvider;
pub use query::{Query, SearchCriteria};
pub use results::{RepositoryItem, SearchResultSet};
pub use search::{OrchestratorState, SearchOrchestrator, Snapshot};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
