//! Plain-text renderer for interactive terminals

use super::{OpenRequest, Renderer, Templates};
use crate::query::SearchCriteria;
use crate::results::RepositoryItem;
use crate::search::{Banner, Snapshot};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct CardView {
    index: usize,
    full_name: String,
    description: Option<String>,
    stars: u64,
    forks: u64,
    open_issues: u64,
    language: String,
    license: String,
    updated: String,
    url: String,
}

impl CardView {
    fn new(index: usize, item: &RepositoryItem, now: DateTime<Utc>) -> Self {
        Self {
            index,
            full_name: item.full_name(),
            description: item.description.clone(),
            stars: item.stars,
            forks: item.forks,
            open_issues: item.open_issues,
            language: item.language.clone().unwrap_or_else(|| "n/a".to_string()),
            license: item
                .license
                .clone()
                .unwrap_or_else(|| "no license".to_string()),
            updated: relative_time(item.updated_at, now),
            url: item.url.clone(),
        }
    }
}

#[derive(Serialize)]
struct ResultsView<'a> {
    app_name: &'a str,
    criteria: String,
    status: String,
    cards: Vec<CardView>,
    single: bool,
    retained_hint: String,
}

#[derive(Serialize)]
struct HelpView<'a> {
    app_name: &'a str,
    version: &'a str,
    min_term_length: usize,
}

/// Renders snapshots as text on stdout
pub struct TerminalRenderer {
    templates: Templates,
    app_name: String,
}

impl TerminalRenderer {
    pub fn new(app_name: impl Into<String>) -> Result<Self> {
        Ok(Self {
            templates: Templates::new()?,
            app_name: app_name.into(),
        })
    }

    /// Render a snapshot to text
    pub fn render_to_string(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> Result<String> {
        let cards = snapshot
            .displayed
            .as_ref()
            .map(|set| {
                set.items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| CardView::new(i + 1, item, now))
                    .collect()
            })
            .unwrap_or_default();

        let single = snapshot.picked && snapshot.displayed.is_some();
        let retained_hint = snapshot
            .displayed
            .as_ref()
            .map(|set| format!("{} repositories", set.total_count))
            .unwrap_or_default();

        let view = ResultsView {
            app_name: &self.app_name,
            criteria: criteria_label(&snapshot.criteria),
            status: banner_text(&snapshot.banner),
            cards,
            single,
            retained_hint,
        };
        self.templates.render("results.txt", &view)
    }

    pub fn help(&self, min_term_length: usize) -> Result<String> {
        self.templates.render(
            "help.txt",
            &HelpView {
                app_name: &self.app_name,
                version: crate::VERSION,
                min_term_length,
            },
        )
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, snapshot: &Snapshot) -> Result<()> {
        let text = self.render_to_string(snapshot, Utc::now())?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", text)?;
        stdout.flush()?;
        Ok(())
    }

    fn open_repository(&self, request: &OpenRequest) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(
            stdout,
            "Open in a new browser window (target={}, rel=\"{}\"): {}",
            request.target, request.rel, request.url
        )?;
        Ok(())
    }
}

fn criteria_label(criteria: &SearchCriteria) -> String {
    match (&criteria.term, &criteria.language) {
        (Some(term), Some(lang)) => format!("{} in {}", term, lang),
        (Some(term), None) => term.clone(),
        (None, Some(lang)) => lang.clone(),
        (None, None) => String::new(),
    }
}

fn banner_text(banner: &Banner) -> String {
    match banner {
        Banner::Prompt => "Type a search term or choose a language.".to_string(),
        Banner::Waiting => "...".to_string(),
        Banner::Searching => "Searching...".to_string(),
        Banner::Found { total } => format!("Found {} repositories.", total),
        Banner::NoResults => "No repositories match. Try another term or language.".to_string(),
        Banner::Failed { message, retryable } => {
            if *retryable {
                format!("Search failed: {}. Type :retry to try again.", message)
            } else {
                format!("Search failed: {}.", message)
            }
        }
        Banner::Neutral => String::new(),
    }
}

/// Human readable age of `time` relative to `now`
pub fn relative_time(time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(time);
    let days = age.num_days();

    if age.num_minutes() < 1 {
        "just now".to_string()
    } else if age.num_hours() < 1 {
        plural(age.num_minutes(), "minute")
    } else if days < 1 {
        plural(age.num_hours(), "hour")
    } else if days < 30 {
        plural(days, "day")
    } else if days < 365 {
        plural(days / 30, "month")
    } else {
        plural(days / 365, "year")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
