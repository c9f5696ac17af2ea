//! Command implementations for the fedsearch CLI.
//!
//! Handles:
//! - search: Load config and fixture, run a federated search, print results
//! - normalize: Print the structured form of a raw query

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fedsearch_engine::{QueryNormalizer, SearchEngine};
use fedsearch_types::{Reference, ResourceId, SearchRequest, SearchResponse, Settings, UserRef};

use crate::cli::SearchArgs;
use crate::fixture::FixtureBackend;

/// Load configuration (defaults -> file -> env -> CLI) and apply the global
/// CLI overrides.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(log_level) = log_level {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the tracing subscriber. Logs go to stderr so JSON output on
/// stdout stays parseable.
fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Translate CLI arguments into a search request.
pub fn build_request(args: &SearchArgs) -> Result<SearchRequest> {
    let mut request = SearchRequest::new(args.query.clone()).with_page_size(args.page_size);

    if let Some(space) = &args.space {
        let root: ResourceId = space
            .parse()
            .with_context(|| format!("Invalid --space '{}'", space))?;
        request = request.with_reference(Reference::new(
            root,
            args.path.clone().unwrap_or_default(),
        ));
    }
    if let Some(token) = &args.page_token {
        request = request.with_page_token(token.clone());
    }
    for (key, value) in &args.filters {
        request = request.with_space_filter(key.clone(), value.clone());
    }

    Ok(request)
}

/// Run a search against the fixture backend.
pub async fn execute_search(
    settings: &Settings,
    args: &SearchArgs,
    cancel: &CancellationToken,
) -> Result<SearchResponse> {
    let fixture_path = args
        .fixtures
        .as_deref()
        .or(settings.fixture_path.as_deref())
        .context("No fixture given (use --fixtures or set fixture_path in the config)")?;

    let backend = Arc::new(FixtureBackend::load(fixture_path)?);
    let engine = SearchEngine::with_config(
        backend.clone(),
        backend.clone(),
        backend,
        settings.engine.clone(),
    );

    let request = build_request(args)?;
    let user = UserRef::new(args.user.clone());

    engine
        .search(cancel, &user, &request)
        .await
        .with_context(|| format!("Search for '{}' failed", args.query))
}

/// Search command entry point.
///
/// Ctrl+C cancels the outstanding space searches.
pub async fn run_search(
    config_path: Option<&str>,
    log_level: Option<&str>,
    args: SearchArgs,
) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings)?;

    info!(
        query = %args.query,
        user = %args.user,
        page_size = args.page_size,
        max_concurrent_spaces = settings.engine.max_concurrent_spaces,
        "Running search"
    );

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling search...");
            on_interrupt.cancel();
        }
    });

    let result = execute_search(&settings, &args, &cancel).await;
    watcher.abort();
    let response = result?;

    if !response.failed_spaces.is_empty() {
        warn!(
            failed = response.failed_spaces.len(),
            "Some spaces could not be searched"
        );
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).context("Failed to encode response")?
        );
    } else {
        print!("{}", render_response(&response));
    }

    Ok(())
}

/// Human-readable listing of a response.
pub fn render_response(response: &SearchResponse) -> String {
    let mut out = String::new();

    if response.matches.is_empty() {
        out.push_str("No matches found.\n");
    }
    for (rank, m) in response.matches.iter().enumerate() {
        let entity = &m.entity;
        out.push_str(&format!(
            "{:>3}. {:<8.3} {}\n",
            rank + 1,
            m.score,
            entity.name
        ));
        out.push_str(&format!(
            "     {} {}\n",
            entity.reference.resource_id, entity.reference.path
        ));
    }

    out.push_str(&format!(
        "\n{} of {} total matches\n",
        response.matches.len(),
        response.total_matches
    ));
    if let Some(token) = &response.next_page_token {
        out.push_str(&format!("Next page: --page-token {}\n", token));
    }
    for root in &response.failed_spaces {
        out.push_str(&format!("Failed space: {}\n", root));
    }

    out
}

/// Normalize command entry point.
pub fn run_normalize(config_path: Option<&str>, log_level: Option<&str>, query: &str) -> Result<()> {
    let settings = load_settings(config_path, log_level)?;
    init_logging(&settings)?;

    let normalized = QueryNormalizer::new()
        .with_name_field(settings.engine.name_field.clone())
        .normalize(query)
        .with_context(|| format!("Failed to normalize '{}'", query))?;
    println!("{}", normalized);
    Ok(())
}
