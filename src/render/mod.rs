//! Rendering collaborators
//!
//! Turn published snapshots into visible output and handle requests to open
//! a repository.

mod templates;
mod terminal;

pub use templates::Templates;
pub use terminal::{relative_time, TerminalRenderer};

use crate::results::RepositoryItem;
use crate::search::Snapshot;
use anyhow::{bail, Result};
use url::Url;

/// Request to open a repository in a fresh browsing context that gets
/// neither an opener handle nor a referrer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub url: Url,
    pub target: &'static str,
    pub rel: &'static str,
}

impl OpenRequest {
    /// Build a request for `url`; only http(s) URLs are accepted
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("Refusing to open {} URL: {}", url.scheme(), url);
        }
        Ok(Self {
            url,
            target: "_blank",
            rel: "noopener noreferrer",
        })
    }

    pub fn for_item(item: &RepositoryItem) -> Result<Self> {
        Self::new(&item.url)
    }
}

/// Something that can show search snapshots
pub trait Renderer: Send + Sync {
    /// Show the current state and data
    fn render(&self, snapshot: &Snapshot) -> Result<()>;

    /// Open a repository
    fn open_repository(&self, request: &OpenRequest) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::fixtures::item;

    #[test]
    fn test_open_request_attributes() {
        let request = OpenRequest::for_item(&item("tokio-rs", "tokio", 1)).unwrap();
        assert_eq!(request.url.as_str(), "https://github.com/tokio-rs/tokio");
        assert_eq!(request.target, "_blank");
        assert_eq!(request.rel, "noopener noreferrer");
    }

    #[test]
    fn test_open_request_rejects_other_schemes() {
        assert!(OpenRequest::new("javascript:alert(1)").is_err());
        assert!(OpenRequest::new("file:///etc/passwd").is_err());
        assert!(OpenRequest::new("not a url").is_err());
    }
}
