//! Request controller
//!
//! Owns at most one in-flight provider request and cancels it when a newer
//! one starts.

use super::error::FetchError;
use crate::metrics::SearchMetrics;
use crate::provider::RepositoryProvider;
use crate::query::Query;
use crate::results::SearchResultSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct InFlightRequest {
    id: u64,
    query: Query,
    token: CancellationToken,
}

/// Single-slot owner of provider requests
pub struct RequestController {
    provider: Arc<dyn RepositoryProvider>,
    in_flight: Mutex<Option<InFlightRequest>>,
    next_id: AtomicU64,
    metrics: Arc<SearchMetrics>,
}

impl RequestController {
    pub fn new(provider: Arc<dyn RepositoryProvider>, metrics: Arc<SearchMetrics>) -> Self {
        Self {
            provider,
            in_flight: Mutex::new(None),
            next_id: AtomicU64::new(1),
            metrics,
        }
    }

    /// Fetch `query`, cancelling whatever was in flight.
    ///
    /// Settles with `FetchError::Cancelled` when `cancel` fires, when a newer
    /// fetch supersedes this one, or when either happened by the time the
    /// provider answered.
    pub async fn fetch(
        &self,
        query: &Query,
        cancel: &CancellationToken,
    ) -> Result<SearchResultSet, FetchError> {
        let token = cancel.child_token();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut slot = self.slot();
            if let Some(previous) = slot.replace(InFlightRequest {
                id,
                query: query.clone(),
                token: token.clone(),
            }) {
                debug!("Superseding in-flight request for '{}'", previous.query);
                previous.token.cancel();
            }
        }

        self.metrics.record_fetch();
        let start = Instant::now();

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(FetchError::Cancelled),
            result = self.provider.search(query) => result,
        };

        // A late answer for a cancelled request is discarded
        let result = if token.is_cancelled() {
            Err(FetchError::Cancelled)
        } else {
            result
        };

        self.finish(id);

        match &result {
            Ok(_) => self
                .metrics
                .record_response_time(start.elapsed().as_millis() as u64),
            Err(FetchError::Cancelled) => {
                debug!("Request for '{}' cancelled", query);
                self.metrics.record_cancellation();
            }
            Err(_) => {}
        }

        result
    }

    /// Cancel the in-flight request, if any. Safe to call repeatedly.
    pub fn cancel(&self) {
        if let Some(request) = self.slot().take() {
            debug!("Cancelling request for '{}'", request.query);
            request.token.cancel();
        }
    }

    /// Query of the request currently in flight
    pub fn in_flight(&self) -> Option<Query> {
        self.slot().as_ref().map(|r| r.query.clone())
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn finish(&self, id: u64) {
        let mut slot = self.slot();
        if slot.as_ref().map(|r| r.id) == Some(id) {
            *slot = None;
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<InFlightRequest>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
