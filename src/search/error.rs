//! Search failure taxonomy

use thiserror::Error;

/// Why a fetch did not produce a result set
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Superseded or torn down; never shown to the user
    #[error("request cancelled")]
    Cancelled,
    /// The provider answered with a non-2xx status
    #[error("provider error {status}: {message}")]
    Provider { status: u16, message: String },
    /// Unreachable provider or unreadable response body
    #[error("transport error: {message}")]
    Transport { message: String },
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status for provider errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// User-visible failure carried by the `Error` state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFailure {
    /// HTTP status, when the provider rejected the request
    pub status: Option<u16>,
    pub message: String,
    /// A retry trigger is offered
    pub retryable: bool,
}

impl SearchFailure {
    /// Failure for a fetch error, `None` for cancellation
    pub fn from_fetch_error(err: &FetchError) -> Option<Self> {
        match err {
            FetchError::Cancelled => None,
            FetchError::Provider { status, message } => Some(Self {
                status: Some(*status),
                message: message.clone(),
                retryable: true,
            }),
            FetchError::Transport { message } => Some(Self {
                status: None,
                message: message.clone(),
                retryable: true,
            }),
        }
    }
}

impl std::fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}
