//! Orchestrator states and the snapshot published to renderers

use super::error::SearchFailure;
use crate::query::SearchCriteria;
use crate::results::SearchResultSet;
use std::sync::Arc;

/// Where the search state machine currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorState {
    Idle,
    Debouncing,
    Loading,
    Success(Arc<SearchResultSet>),
    Empty,
    Error(SearchFailure),
}

impl OrchestratorState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Debouncing => "debouncing",
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::Empty => "empty",
            Self::Error(_) => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Terminal state for a result set: `Success` with items, `Empty` otherwise
    pub(crate) fn for_results(results: Arc<SearchResultSet>) -> Self {
        if results.is_empty() {
            Self::Empty
        } else {
            Self::Success(results)
        }
    }
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Status line shown above the results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    /// Ask for a term or language
    Prompt,
    /// Waiting for typing to settle
    Waiting,
    Searching,
    Found { total: u64 },
    NoResults,
    Failed { message: String, retryable: bool },
    /// Found banner after its dwell time
    Neutral,
}

impl Banner {
    pub(crate) fn for_state(state: &OrchestratorState) -> Self {
        match state {
            OrchestratorState::Idle => Self::Prompt,
            OrchestratorState::Debouncing => Self::Waiting,
            OrchestratorState::Loading => Self::Searching,
            OrchestratorState::Success(set) => Self::Found {
                total: set.total_count,
            },
            OrchestratorState::Empty => Self::NoResults,
            OrchestratorState::Error(failure) => Self::Failed {
                message: failure.to_string(),
                retryable: failure.retryable,
            },
        }
    }
}

/// Everything a renderer needs, published on every change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub state: OrchestratorState,
    pub banner: Banner,
    /// Result set currently on screen
    pub displayed: Option<Arc<SearchResultSet>>,
    /// `displayed` holds a random pick rather than the full page
    pub picked: bool,
    /// Criteria of the latest resolution
    pub criteria: SearchCriteria,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            state: OrchestratorState::Idle,
            banner: Banner::Prompt,
            displayed: None,
            picked: false,
            criteria: SearchCriteria::default(),
        }
    }
}

/// What a trigger ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The trigger's outcome became the current state
    Applied(OrchestratorState),
    /// A newer trigger (or teardown) took over first
    Superseded,
    /// The trigger is not valid in the current state
    Ignored,
}

impl Resolution {
    pub fn state(&self) -> Option<&OrchestratorState> {
        match self {
            Self::Applied(state) => Some(state),
            _ => None,
        }
    }
}
