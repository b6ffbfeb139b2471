//! GitHub repository search provider
//!
//! Uses GitHub's official search API.

use super::traits::*;
use crate::config::{ProviderSettings, SearchSettings};
use crate::network::HttpClient;
use crate::query::Query;
use crate::results::{RepositoryItem, SearchResultSet};
use crate::search::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct SearchBody {
    total_count: u64,
    #[serde(default)]
    items: Vec<RepositoryBody>,
}

#[derive(Debug, Deserialize)]
struct RepositoryBody {
    name: String,
    owner: OwnerBody,
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    stargazers_count: u64,
    #[serde(default)]
    forks_count: u64,
    #[serde(default)]
    open_issues_count: u64,
    language: Option<String>,
    license: Option<LicenseBody>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct OwnerBody {
    login: String,
}

#[derive(Debug, Deserialize)]
struct LicenseBody {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl From<RepositoryBody> for RepositoryItem {
    fn from(body: RepositoryBody) -> Self {
        Self {
            name: body.name,
            owner: body.owner.login,
            description: body.description.filter(|d| !d.is_empty()),
            stars: body.stargazers_count,
            forks: body.forks_count,
            open_issues: body.open_issues_count,
            language: body.language,
            license: body.license.and_then(|l| l.name),
            updated_at: body.updated_at,
            url: body.html_url,
        }
    }
}

/// GitHub repository search provider
pub struct GitHub {
    client: HttpClient,
    api_url: String,
    per_page: u32,
}

impl GitHub {
    pub fn new(client: HttpClient) -> Self {
        Self::with_settings(
            client,
            &ProviderSettings::default(),
            &SearchSettings::default(),
        )
    }

    pub fn with_settings(
        client: HttpClient,
        provider: &ProviderSettings,
        search: &SearchSettings,
    ) -> Self {
        Self {
            client,
            api_url: provider.api_url.clone(),
            per_page: search.per_page,
        }
    }

    /// Build the HTTP request for a query
    pub fn request(&self, query: &Query) -> ProviderRequest {
        ProviderRequest::get(&self.api_url)
            .param("q", query.as_str())
            .param("sort", "stars")
            .param("order", "desc")
            .param("per_page", self.per_page.to_string())
            .header("Accept", "application/vnd.github+json")
    }

    /// Parse the HTTP response into a result set
    pub fn response(&self, response: ProviderResponse) -> Result<SearchResultSet, FetchError> {
        if !response.is_success() {
            let message = if response.status == 403 || response.is_rate_limited() {
                "GitHub API rate limit exceeded".to_string()
            } else {
                serde_json::from_str::<ErrorBody>(&response.text)
                    .ok()
                    .and_then(|b| b.message)
                    .unwrap_or_else(|| format!("HTTP error: {}", response.status))
            };
            return Err(FetchError::Provider {
                status: response.status,
                message,
            });
        }

        let body: SearchBody =
            serde_json::from_str(&response.text).map_err(|e| FetchError::Transport {
                message: format!("Failed to parse JSON: {}", e),
            })?;

        let items: Vec<RepositoryItem> = body.items.into_iter().map(Into::into).collect();
        debug!(
            "GitHub returned {} of {} repositories",
            items.len(),
            body.total_count
        );

        Ok(SearchResultSet::new(body.total_count, items))
    }
}

#[async_trait]
impl RepositoryProvider for GitHub {
    fn name(&self) -> &str {
        "github"
    }

    async fn search(&self, query: &Query) -> Result<SearchResultSet, FetchError> {
        let response = self
            .client
            .execute(self.request(query))
            .await
            .map_err(|e| FetchError::Transport {
                message: e.to_string(),
            })?;
        self.response(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{build, SearchCriteria};
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo_json(owner: &str, name: &str, stars: u64) -> serde_json::Value {
        json!({
            "name": name,
            "owner": { "login": owner },
            "description": "A repository",
            "html_url": format!("https://github.com/{}/{}", owner, name),
            "stargazers_count": stars,
            "forks_count": 12,
            "open_issues_count": 4,
            "language": "Rust",
            "license": { "name": "MIT License" },
            "updated_at": "2024-06-01T10:00:00Z"
        })
    }

    fn response(status: u16, text: &str) -> ProviderResponse {
        ProviderResponse {
            status,
            headers: HashMap::new(),
            text: text.to_string(),
            url: String::new(),
        }
    }

    fn github_at(url: String) -> GitHub {
        let provider = ProviderSettings {
            api_url: url,
            ..Default::default()
        };
        GitHub::with_settings(HttpClient::new().unwrap(), &provider, &SearchSettings::default())
    }

    #[test]
    fn test_github_request() {
        let github = GitHub::new(HttpClient::new().unwrap());
        let query = build(&SearchCriteria::language("Rust"));
        let request = github.request(&query);

        assert!(request.url.contains("api.github.com"));
        assert_eq!(request.params["q"], "language:Rust stars:>10");
        assert_eq!(request.params["sort"], "stars");
        assert_eq!(request.params["order"], "desc");
        assert_eq!(request.params["per_page"], "15");
        assert!(request.headers.contains_key("Accept"));
    }

    #[test]
    fn test_parse_items() {
        let github = GitHub::new(HttpClient::new().unwrap());
        let body = json!({
            "total_count": 2,
            "items": [repo_json("tokio-rs", "tokio", 25000), repo_json("serde-rs", "serde", 9000)]
        });

        let set = github.response(response(200, &body.to_string())).unwrap();
        assert_eq!(set.total_count, 2);
        assert_eq!(set.items[0].full_name(), "tokio-rs/tokio");
        assert_eq!(set.items[0].stars, 25000);
        assert_eq!(set.items[0].license.as_deref(), Some("MIT License"));
        assert_eq!(set.items[1].url, "https://github.com/serde-rs/serde");
    }

    #[test]
    fn test_optional_fields() {
        let github = GitHub::new(HttpClient::new().unwrap());
        let body = json!({
            "total_count": 1,
            "items": [{
                "name": "bare",
                "owner": { "login": "someone" },
                "description": null,
                "html_url": "https://github.com/someone/bare",
                "stargazers_count": 11,
                "forks_count": 0,
                "open_issues_count": 0,
                "language": null,
                "license": null,
                "updated_at": "2023-01-01T00:00:00Z"
            }]
        });

        let set = github.response(response(200, &body.to_string())).unwrap();
        let item = &set.items[0];
        assert!(item.description.is_none());
        assert!(item.language.is_none());
        assert!(item.license.is_none());
    }

    #[test]
    fn test_error_status_uses_provider_message() {
        let github = GitHub::new(HttpClient::new().unwrap());
        let err = github
            .response(response(422, r#"{"message":"Validation Failed"}"#))
            .unwrap_err();
        assert_eq!(
            err,
            FetchError::Provider {
                status: 422,
                message: "Validation Failed".to_string()
            }
        );

        let err = github.response(response(503, "<html>")).unwrap_err();
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn test_rate_limit_message() {
        let github = GitHub::new(HttpClient::new().unwrap());
        let err = github.response(response(403, "{}")).unwrap_err();
        assert!(err.to_string().contains("rate limit"));
    }

    #[test]
    fn test_malformed_body_is_transport_error() {
        let github = GitHub::new(HttpClient::new().unwrap());
        let err = github.response(response(200, "not json")).unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_search_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/repositories"))
            .and(query_param("q", "http language:Go stars:>10"))
            .and(query_param("per_page", "15"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 1,
                "items": [repo_json("gin-gonic", "gin", 70000)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let github = github_at(format!("{}/search/repositories", server.uri()));
        let query = build(&SearchCriteria::new(Some("Go"), Some("http")));
        let set = github.search(&query).await.unwrap();

        assert_eq!(set.len(), 1);
        assert_eq!(set.items[0].name, "gin");
    }

    #[tokio::test]
    async fn test_search_unreachable_is_transport_error() {
        // Nothing listens on port 9 locally
        let github = github_at("http://127.0.0.1:9/search".to_string());
        let err = github
            .search(&build(&SearchCriteria::term("anything")))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
    }
}
