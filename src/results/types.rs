//! Result type definitions

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A single repository returned by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryItem {
    /// Repository name
    pub name: String,
    /// Owner login
    pub owner: String,
    /// Description
    pub description: Option<String>,
    /// Stargazer count
    pub stars: u64,
    /// Fork count
    pub forks: u64,
    /// Open issue count
    pub open_issues: u64,
    /// Primary language
    pub language: Option<String>,
    /// License name
    pub license: Option<String>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
    /// Canonical repository URL
    pub url: String,
}

impl RepositoryItem {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// One page of repository results, sorted by stars descending as returned
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResultSet {
    /// Number of matches the provider reports across all pages
    pub total_count: u64,
    /// Items on this page
    pub items: Vec<RepositoryItem>,
}

impl SearchResultSet {
    pub fn new(total_count: u64, items: Vec<RepositoryItem>) -> Self {
        Self { total_count, items }
    }

    /// No items on the page
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Choose one item with the given random source
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&RepositoryItem> {
        self.items.choose(rng)
    }

    /// A set holding only `item`, keeping the reported total
    pub fn single(&self, item: RepositoryItem) -> Self {
        Self {
            total_count: self.total_count,
            items: vec![item],
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;

    pub fn item(owner: &str, name: &str, stars: u64) -> RepositoryItem {
        RepositoryItem {
            name: name.to_string(),
            owner: owner.to_string(),
            description: Some(format!("{} by {}", name, owner)),
            stars,
            forks: stars / 10,
            open_issues: 3,
            language: Some("Rust".to_string()),
            license: Some("MIT License".to_string()),
            updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            url: format!("https://github.com/{}/{}", owner, name),
        }
    }

    pub fn result_set(names: &[&str]) -> SearchResultSet {
        let items: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, name)| item("owner", name, 1000 - i as u64))
            .collect();
        SearchResultSet::new(items.len() as u64, items)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pick_random_from_empty_set() {
        let set = SearchResultSet::default();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(set.pick_random(&mut rng).is_none());
    }

    #[test]
    fn test_pick_random_is_reproducible() {
        let set = result_set(&["tokio", "serde", "rayon", "clap"]);

        let first = set
            .pick_random(&mut StdRng::seed_from_u64(42))
            .cloned();
        let second = set
            .pick_random(&mut StdRng::seed_from_u64(42))
            .cloned();

        assert!(first.is_some());
        assert_eq!(first, second);
        assert!(set.items.contains(first.as_ref().unwrap()));
    }

    #[test]
    fn test_single_keeps_total() {
        let set = SearchResultSet::new(120, result_set(&["a", "b"]).items);
        let single = set.single(set.items[1].clone());
        assert_eq!(single.total_count, 120);
        assert_eq!(single.len(), 1);
        assert_eq!(single.items[0].name, "b");
    }

    #[test]
    fn test_full_name() {
        assert_eq!(item("rust-lang", "rust", 1).full_name(), "rust-lang/rust");
    }
}
