//! Metrics collection module
//!
//! Tracks how searches are resolved during a session: cache hits, network
//! fetches, cancellations, failures and provider response times.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

/// Response times kept for the rolling average
const RESPONSE_WINDOW: usize = 100;

/// Session search counters
pub struct SearchMetrics {
    /// Resolutions attempted (cache or network)
    resolutions: AtomicU64,
    cache_hits: AtomicU64,
    network_fetches: AtomicU64,
    cancellations: AtomicU64,
    errors: AtomicU64,
    /// Provider response times in ms
    response_times: RwLock<Vec<u64>>,
}

impl SearchMetrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            resolutions: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            network_fetches: AtomicU64::new(0),
            cancellations: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            response_times: RwLock::new(Vec::new()),
        }
    }

    pub fn record_resolution(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.network_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.cancellations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record provider response time
    pub fn record_response_time(&self, time_ms: u64) {
        let mut times = self
            .response_times
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if times.len() >= RESPONSE_WINDOW {
            times.remove(0);
        }
        times.push(time_ms);
    }

    pub fn resolutions(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn network_fetches(&self) -> u64 {
        self.network_fetches.load(Ordering::Relaxed)
    }

    pub fn cancellations(&self) -> u64 {
        self.cancellations.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Average provider response time
    pub fn avg_response_time(&self) -> Option<u64> {
        let times = self
            .response_times
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if times.is_empty() {
            None
        } else {
            Some(times.iter().sum::<u64>() / times.len() as u64)
        }
    }

    /// Share of resolutions served from cache, in percent
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.resolutions();
        if total == 0 {
            0.0
        } else {
            (self.cache_hits() as f64 / total as f64) * 100.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            resolutions: self.resolutions(),
            cache_hits: self.cache_hits(),
            network_fetches: self.network_fetches(),
            cancellations: self.cancellations(),
            errors: self.errors(),
            avg_response_time: self.avg_response_time(),
        }
    }
}

impl Default for SearchMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSummary {
    pub resolutions: u64,
    pub cache_hits: u64,
    pub network_fetches: u64,
    pub cancellations: u64,
    pub errors: u64,
    pub avg_response_time: Option<u64>,
}
