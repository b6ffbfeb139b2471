//! Search orchestration module
//!
//! Decides when a request is issued, which request supersedes another,
//! whether the cache can answer instead, and how outcomes become states.

mod controller;
mod debounce;
mod error;
mod orchestrator;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::RequestController;
pub use debounce::DebounceGate;
pub use error::{FetchError, SearchFailure};
pub use orchestrator::{OrchestratorBuilder, SearchOrchestrator};
pub use state::{Banner, OrchestratorState, Resolution, Snapshot};
