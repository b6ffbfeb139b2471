//! HTTP client for making requests to the search provider

use crate::config::ProviderSettings;
use crate::provider::{ProviderRequest, ProviderResponse};
use anyhow::{Context, Result};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;

/// HTTP client wrapper with repo-finder specific configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&ProviderSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &ProviderSettings) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(settings.request_timeout)
            .with_context(|| format!("Invalid request timeout: {}", settings.request_timeout))?;

        let mut builder = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true);

        // SSL verification
        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: timeout,
            user_agent: settings.user_agent.clone(),
        })
    }

    /// Execute a provider request.
    ///
    /// Dropping the returned future aborts the transfer.
    pub async fn execute(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        let mut req_builder = self
            .client
            .get(&request.url)
            .timeout(self.default_timeout)
            .header("User-Agent", &self.user_agent);

        // Custom headers override the defaults
        for (key, value) in &request.headers {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        let response = req_builder.send().await?;

        Self::parse_response(response).await
    }

    /// Parse response into ProviderResponse
    async fn parse_response(response: Response) -> Result<ProviderResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let text = response.text().await?;

        Ok(ProviderResponse {
            status,
            headers,
            text,
            url,
        })
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}
