//! Query building
//!
//! Turns the user's criteria (free-text term and/or language filter) into the
//! query string sent to the repository search provider.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Popularity floor appended to every query
pub const DEFAULT_MIN_STARS: u32 = 10;

/// Languages offered by the language selector
pub const KNOWN_LANGUAGES: &[&str] = &[
    "C", "C#", "C++", "Clojure", "CSS", "Dart", "Elixir", "Go", "Haskell", "HTML", "Java",
    "JavaScript", "Julia", "Kotlin", "Lua", "Nix", "OCaml", "PHP", "Python", "R", "Ruby", "Rust",
    "Scala", "Shell", "Swift", "TypeScript", "Zig",
];

/// User supplied search criteria
///
/// Blank strings are normalized to `None`, so an all-`None` value is the
/// idle state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Language filter (e.g. "Rust")
    pub language: Option<String>,
    /// Free-text term
    pub term: Option<String>,
}

impl SearchCriteria {
    /// Create criteria, trimming both fields
    pub fn new(language: Option<&str>, term: Option<&str>) -> Self {
        Self {
            language: normalize(language),
            term: normalize(term),
        }
    }

    /// Criteria with only a language filter
    pub fn language(language: impl AsRef<str>) -> Self {
        Self::new(Some(language.as_ref()), None)
    }

    /// Criteria with only a free-text term
    pub fn term(term: impl AsRef<str>) -> Self {
        Self::new(None, Some(term.as_ref()))
    }

    /// Replace the language, keeping the term
    pub fn with_language(mut self, language: Option<&str>) -> Self {
        self.language = normalize(language);
        self
    }

    /// Replace the term, keeping the language
    pub fn with_term(mut self, term: Option<&str>) -> Self {
        self.term = normalize(term);
        self
    }

    /// Both fields absent
    pub fn is_empty(&self) -> bool {
        self.language.is_none() && self.term.is_none()
    }

    /// Whether text input with these criteria should schedule a search.
    ///
    /// A language selection always qualifies; otherwise the term needs at
    /// least `min_term_length` characters.
    pub fn is_debounce_eligible(&self, min_term_length: usize) -> bool {
        if self.language.is_some() {
            return true;
        }
        self.term
            .as_deref()
            .map(|t| t.chars().count() >= min_term_length)
            .unwrap_or(false)
    }
}

fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Query string sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query(String);

impl Query {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Opaque cache key, safe for any characters in the query
    pub fn cache_key(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0.as_bytes())
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Builds provider queries with a fixed popularity floor
#[derive(Debug, Clone, Copy)]
pub struct QueryBuilder {
    min_stars: u32,
}

impl QueryBuilder {
    pub fn new(min_stars: u32) -> Self {
        Self { min_stars }
    }

    /// Build the query for non-empty criteria.
    ///
    /// Callers route empty criteria to the idle state before getting here; an
    /// empty value still yields just the popularity floor.
    pub fn build(&self, criteria: &SearchCriteria) -> Query {
        let mut query = match (&criteria.term, &criteria.language) {
            (Some(term), Some(lang)) => format!("{} language:{}", term, lang),
            (None, Some(lang)) => format!("language:{}", lang),
            (Some(term), None) => term.clone(),
            (None, None) => String::new(),
        };

        if !query.is_empty() {
            query.push(' ');
        }
        query.push_str(&format!("stars:>{}", self.min_stars));

        Query(query)
    }
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_STARS)
    }
}

/// Build a query with the default popularity floor
pub fn build(criteria: &SearchCriteria) -> Query {
    QueryBuilder::default().build(criteria)
}
