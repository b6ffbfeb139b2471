//! repo-finder: interactive repository search in the terminal
//!
//! This is the main entry point for the application.

use anyhow::{Context, Result};
use repo_finder::{
    config::{self, Settings},
    network::HttpClient,
    preferences::FilePreferenceStore,
    provider::GitHub,
    query::{SearchCriteria, KNOWN_LANGUAGES},
    render::{OpenRequest, Renderer, TerminalRenderer},
    search::{Resolution, SearchOrchestrator},
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = match parse_args(std::env::args().skip(1))? {
        Args::Run { config } => config,
        Args::Help => {
            print_usage();
            return Ok(());
        }
        Args::Version => {
            println!("repo-finder {}", repo_finder::VERSION);
            return Ok(());
        }
    };

    let settings = config::load_settings(config_path.as_deref())?;
    init_logging(&settings);
    info!("Starting repo-finder v{}", repo_finder::VERSION);

    let client = HttpClient::with_settings(&settings.provider)?;
    let provider = Arc::new(GitHub::with_settings(
        client,
        &settings.provider,
        &settings.search,
    ));

    let mut builder = SearchOrchestrator::builder(provider).settings(&settings.search);
    if let Some(store) = FilePreferenceStore::from_settings(&settings.preferences) {
        info!("Preferences stored in {}", store.path().display());
        builder = builder.preferences(Arc::new(store));
    }
    let orchestrator = builder.build();
    let renderer = Arc::new(TerminalRenderer::new(settings.general.app_name.clone())?);

    // Render every published snapshot
    let mut updates = orchestrator.subscribe();
    let render_task = tokio::spawn({
        let renderer = renderer.clone();
        async move {
            while updates.changed().await.is_ok() {
                let snapshot = updates.borrow_and_update().clone();
                if let Err(e) = renderer.render(&snapshot) {
                    error!("Failed to render results: {}", e);
                }
            }
        }
    });

    println!("{}", renderer.help(settings.search.min_term_length)?);

    let mut session = Session {
        criteria: orchestrator.restored_criteria(),
        orchestrator: orchestrator.clone(),
        renderer,
        min_term_length: settings.search.min_term_length,
    };
    tokio::spawn(orchestrator.mount());

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                if !session.handle(Command::parse(&line)) {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down");
                break;
            }
        }
    }

    orchestrator.teardown();
    render_task.abort();

    let summary = orchestrator.metrics().summary();
    info!(
        "Session finished: {} searches, {} from cache, {} network requests",
        summary.resolutions, summary.cache_hits, summary.network_fetches
    );
    Ok(())
}

/// Command line arguments
#[derive(Debug, PartialEq)]
enum Args {
    Run { config: Option<PathBuf> },
    Help,
    Version,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut config = None;
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(Args::Help),
            "-V" | "--version" => return Ok(Args::Version),
            "-c" | "--config" => {
                let path = args
                    .next()
                    .with_context(|| format!("{} requires a file argument", arg))?;
                config = Some(PathBuf::from(path));
            }
            other => anyhow::bail!("Unknown argument: {}", other),
        }
    }

    Ok(Args::Run { config })
}

/// Initialize logging on stderr; RUST_LOG overrides the settings
fn init_logging(settings: &Settings) {
    let default = if settings.general.debug {
        "repo_finder=debug"
    } else {
        "repo_finder=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// One line of user input
#[derive(Debug, PartialEq)]
enum Command {
    Text(String),
    Language(Option<String>),
    Languages,
    Submit,
    Retry,
    Random,
    All,
    Open(usize),
    Stats,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(command) = line.strip_prefix(':') else {
            return Self::Text(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match name {
            "lang" | "language" => {
                Self::Language((!arg.is_empty()).then(|| arg.to_string()))
            }
            "langs" | "languages" => Self::Languages,
            "submit" | "s" => Self::Submit,
            "retry" | "r" => Self::Retry,
            "random" => Self::Random,
            "all" => Self::All,
            "open" | "o" => match arg.parse() {
                Ok(n) if n > 0 => Self::Open(n),
                _ => Self::Unknown(line.to_string()),
            },
            "stats" => Self::Stats,
            "help" | "h" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

/// Interactive session state
struct Session {
    orchestrator: SearchOrchestrator,
    renderer: Arc<TerminalRenderer>,
    criteria: SearchCriteria,
    min_term_length: usize,
}

impl Session {
    /// Handle one command; returns false to exit.
    ///
    /// Searches run on spawned tasks so input keeps being read while a
    /// request is in flight.
    fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Text(text) => {
                self.criteria = self.criteria.clone().with_term(Some(&text));
                self.orchestrator.on_text_input(self.criteria.clone());
            }
            Command::Language(language) => {
                self.criteria = self.criteria.clone().with_language(language.as_deref());
                tokio::spawn(self.orchestrator.change_language(self.criteria.clone()));
            }
            Command::Languages => println!("{}", KNOWN_LANGUAGES.join(", ")),
            Command::Submit => {
                tokio::spawn(self.orchestrator.submit_search(self.criteria.clone()));
            }
            Command::Retry => {
                let retry = self.orchestrator.retry();
                tokio::spawn(async move {
                    if matches!(retry.await, Resolution::Ignored) {
                        println!("Nothing to retry.");
                    }
                });
            }
            Command::Random => {
                if self.orchestrator.pick_random().is_none() {
                    println!("A random pick needs search results first.");
                }
            }
            Command::All => {
                self.orchestrator.show_all();
            }
            Command::Open(n) => self.open(n),
            Command::Stats => {
                let metrics = self.orchestrator.metrics();
                println!(
                    "searches: {}  cache hits: {} ({:.0}%)  requests: {}  cancelled: {}  errors: {}  avg response: {}",
                    metrics.resolutions(),
                    metrics.cache_hits(),
                    metrics.cache_hit_rate(),
                    metrics.network_fetches(),
                    metrics.cancellations(),
                    metrics.errors(),
                    metrics
                        .avg_response_time()
                        .map(|ms| format!("{} ms", ms))
                        .unwrap_or_else(|| "n/a".to_string())
                );
            }
            Command::Help => match self.renderer.help(self.min_term_length) {
                Ok(help) => println!("{}", help),
                Err(e) => error!("Failed to render help: {}", e),
            },
            Command::Quit => return false,
            Command::Unknown(line) => println!("Unknown command: {} (:help lists commands)", line),
        }
        true
    }

    fn open(&self, n: usize) {
        let snapshot = self.orchestrator.snapshot();
        let Some(item) = snapshot
            .displayed
            .as_ref()
            .and_then(|set| set.items.get(n - 1))
        else {
            println!("No result number {}.", n);
            return;
        };

        match OpenRequest::for_item(item) {
            Ok(request) => {
                if let Err(e) = self.renderer.open_repository(&request) {
                    error!("Failed to open {}: {}", item.url, e);
                }
            }
            Err(e) => error!("Failed to open {}: {}", item.url, e),
        }
    }
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
repo-finder v{}
Search GitHub repositories by term and language from the terminal

USAGE:
    repo-finder [OPTIONS]

OPTIONS:
    -c, --config <FILE>    Path to configuration file
    -h, --help             Print help information
    -V, --version          Print version information

ENVIRONMENT VARIABLES:
    REPO_FINDER_SETTINGS_PATH     Path to settings.yml
    REPO_FINDER_DEBUG             Enable debug logging (true/false)
    REPO_FINDER_API_URL           Repository search endpoint
    REPO_FINDER_DEBOUNCE_MS       Typing quiet period in milliseconds
    REPO_FINDER_CACHE_TTL_SECS    Cache freshness window in seconds
    REPO_FINDER_PREFERENCES_PATH  Preference file location
    REPO_FINDER_RANDOM_SEED       Seed for random picks
"#,
        repo_finder::VERSION
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use repo_finder::provider::RepositoryProvider;
    use repo_finder::search::{FetchError, OrchestratorState};
    use repo_finder::{Query, SearchResultSet};
    use std::time::Duration;

    /// Provider that never answers
    struct Stalled;

    #[async_trait]
    impl RepositoryProvider for Stalled {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn search(&self, _: &Query) -> Result<SearchResultSet, FetchError> {
            std::future::pending().await
        }
    }

    fn session() -> Session {
        let orchestrator = SearchOrchestrator::builder(Arc::new(Stalled)).build();
        Session {
            orchestrator,
            renderer: Arc::new(TerminalRenderer::new("Repo Finder").unwrap()),
            criteria: SearchCriteria::default(),
            min_term_length: 3,
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        assert_eq!(parse_args(args(&[])).unwrap(), Args::Run { config: None });
        assert_eq!(parse_args(args(&["-V"])).unwrap(), Args::Version);
        assert_eq!(
            parse_args(args(&["--config", "my.yml"])).unwrap(),
            Args::Run {
                config: Some(PathBuf::from("my.yml"))
            }
        );
        assert!(parse_args(args(&["-c"])).is_err());
        assert!(parse_args(args(&["--bogus"])).is_err());
    }

    #[tokio::test]
    async fn test_searches_do_not_block_input() {
        let mut session = session();
        let mut updates = session.orchestrator.subscribe();

        // both return while their requests are still in flight
        assert!(session.handle(Command::Submit));
        assert!(session.handle(Command::Language(Some("Go".to_string()))));

        tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|s| {
                s.state == OrchestratorState::Loading
                    && s.criteria == SearchCriteria::language("Go")
            }),
        )
        .await
        .expect("language search started")
        .unwrap();

        assert!(!session.handle(Command::Quit));
        session.orchestrator.teardown();
        assert_eq!(session.orchestrator.state(), OrchestratorState::Idle);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  tokio "), Command::Text("tokio".to_string()));
        assert_eq!(
            Command::parse(":lang Rust"),
            Command::Language(Some("Rust".to_string()))
        );
        assert_eq!(Command::parse(":lang"), Command::Language(None));
        assert_eq!(Command::parse(":open 3"), Command::Open(3));
        assert!(matches!(Command::parse(":open 0"), Command::Unknown(_)));
        assert_eq!(Command::parse(":q"), Command::Quit);
        assert!(matches!(Command::parse(":nope"), Command::Unknown(_)));
    }
}
