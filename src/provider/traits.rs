//! Provider traits and types

use crate::query::Query;
use crate::results::SearchResultSet;
use crate::search::FetchError;
use async_trait::async_trait;
use std::collections::HashMap;

/// HTTP GET request to be made for a provider
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// URL to request
    pub url: String,
    /// Request headers
    pub headers: HashMap<String, String>,
    /// Query parameters
    pub params: HashMap<String, String>,
}

impl ProviderRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            params: HashMap::new(),
        }
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// HTTP response from a provider request
#[derive(Debug)]
pub struct ProviderResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response body as text
    pub text: String,
    /// Response URL (after redirects)
    pub url: String,
}

impl ProviderResponse {
    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if response indicates rate limiting
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
            || (self.status == 403
                && self.headers.get("x-ratelimit-remaining").map(String::as_str) == Some("0"))
    }
}

/// A remote repository search backend
///
/// Implementations settle with a result set or a `FetchError`; they never
/// observe cancellation themselves, the request controller drops their
/// future instead.
#[async_trait]
pub trait RepositoryProvider: Send + Sync {
    /// Provider name
    fn name(&self) -> &str;

    /// Run one search for `query`
    async fn search(&self, query: &Query) -> Result<SearchResultSet, FetchError>;
}
