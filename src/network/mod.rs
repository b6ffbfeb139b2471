//! HTTP networking module
//!
//! Provides the HTTP client used to reach the repository search provider.

mod client;

pub use client::HttpClient;
