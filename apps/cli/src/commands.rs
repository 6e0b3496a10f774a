//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use docground_core::{Orchestrator, QueryRequest, QueryResponse};
use docground_extractor::ExtractProgress;
use docground_shared::{AppConfig, init_config, load_config};

use crate::server;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docground: answer questions from a Confluence page tree.
#[derive(Parser)]
#[command(
    name = "docground",
    version,
    about = "Answer questions grounded in a Confluence page tree.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Confluence site URL, overriding the config file.
    #[arg(long, env = "CONFLUENCE_BASE_URL", global = true)]
    pub confluence_url: Option<String>,

    /// Confluence account email, overriding the config file.
    #[arg(long, env = "CONFLUENCE_EMAIL", global = true)]
    pub confluence_email: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Traversal options shared by `query` and `extract`.
#[derive(Args)]
pub(crate) struct TraversalArgs {
    /// Root page URL (repeat for several roots). Defaults to the configured root.
    #[arg(long = "root")]
    pub roots: Vec<String>,

    /// Maximum traversal depth below each root.
    #[arg(long)]
    pub max_depth: Option<i64>,

    /// Maximum number of pages across all roots.
    #[arg(long)]
    pub max_pages: Option<i64>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ask a question grounded in the page tree.
    Query {
        /// The question to answer.
        question: String,

        #[command(flatten)]
        traversal: TraversalArgs,

        /// Provider: bedrock, gemini, or gitlab_duo.
        #[arg(short, long)]
        provider: Option<String>,

        /// Print the full response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Retrieve the page tree without calling a model (prints JSON).
    Extract {
        #[command(flatten)]
        traversal: TraversalArgs,
    },

    /// Serve the HTTP API.
    Serve {
        /// Address to bind.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind.
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docground=info",
        1 => "docground=debug",
        _ => "docground=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = || resolve_config(cli.confluence_url.as_deref(), cli.confluence_email.as_deref());

    match cli.command {
        Command::Query {
            ref question,
            ref traversal,
            ref provider,
            json,
        } => {
            let request = QueryRequest {
                query: Some(question.clone()),
                provider: provider.clone(),
                ..traversal.to_request()
            };
            cmd_query(&config()?, &request, json).await
        }
        Command::Extract { ref traversal } => cmd_extract(&config()?, &traversal.to_request()).await,
        Command::Serve { ref host, port } => cmd_serve(config()?, host.as_deref(), port).await,
        Command::Config { ref action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config()?).await,
        },
    }
}

impl TraversalArgs {
    fn to_request(&self) -> QueryRequest {
        QueryRequest {
            root_page_urls: (!self.roots.is_empty()).then(|| self.roots.clone()),
            max_depth: self.max_depth,
            max_pages: self.max_pages,
            ..Default::default()
        }
    }
}

/// Load the config file and apply CLI/env overrides.
fn resolve_config(confluence_url: Option<&str>, confluence_email: Option<&str>) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(url) = confluence_url.filter(|u| !u.trim().is_empty()) {
        config.confluence.base_url = url.trim().to_string();
    }
    if let Some(email) = confluence_email.filter(|e| !e.trim().is_empty()) {
        config.confluence.email = email.trim().to_string();
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_query(config: &AppConfig, request: &QueryRequest, json: bool) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config)?;

    info!(roots = ?request.root_page_urls, provider = ?request.provider, "running query");

    let progress = CliProgress::new();
    let result = orchestrator.query(request, &progress).await;
    progress.finish();
    let response = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_answer(&response);
    }
    Ok(())
}

fn print_answer(response: &QueryResponse) {
    println!();
    println!("{}", response.answer.trim());
    println!();
    println!(
        "  Provider: {}   Pages retrieved: {}",
        response.provider, response.retrieved_page_count
    );
    println!("  Sources:");
    for source in &response.sources {
        println!("    - {} ({})", source.title, source.source_url);
    }
    println!();
}

async fn cmd_extract(config: &AppConfig, request: &QueryRequest) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config)?;

    let progress = CliProgress::new();
    let result = orchestrator.extract_only(request, &progress).await;
    progress.finish();

    println!("{}", serde_json::to_string_pretty(&result?)?);
    Ok(())
}

async fn cmd_serve(config: AppConfig, host: Option<&str>, port: Option<u16>) -> Result<()> {
    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);
    let host = host.unwrap_or(&config.server.host);
    let port = port.unwrap_or(config.server.port);

    server::serve(orchestrator, host, port)
        .await
        .map_err(|e| eyre!("server on {host}:{port} failed: {e}"))
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Spinner shown while pages are retrieved.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.set_message("Retrieving pages");
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ExtractProgress for CliProgress {
    fn page_retrieved(&self, title: &str, retrieved: usize, max_pages: usize) {
        self.spinner
            .set_message(format!("Retrieved [{retrieved}/{max_pages}] {title}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_query_with_repeated_roots() {
        let cli = Cli::try_parse_from([
            "docground",
            "query",
            "How do we deploy?",
            "--root",
            "https://a.example.com/wiki/pages/1",
            "--root",
            "https://a.example.com/wiki/pages/2",
            "--provider",
            "gemini",
            "--max-pages",
            "20",
            "--json",
        ])
        .unwrap();

        let Command::Query {
            question,
            traversal,
            provider,
            json,
        } = cli.command
        else {
            panic!("expected query command");
        };
        assert_eq!(question, "How do we deploy?");
        assert_eq!(traversal.roots.len(), 2);
        assert_eq!(provider.as_deref(), Some("gemini"));
        assert!(json);

        let request = traversal.to_request();
        assert_eq!(request.max_pages, Some(20));
        assert_eq!(request.max_depth, None);
        assert_eq!(request.root_page_urls.map(|r| r.len()), Some(2));
    }

    #[test]
    fn extract_without_roots_leaves_them_unset() {
        let cli = Cli::try_parse_from(["docground", "extract", "--max-depth", "2"]).unwrap();
        let Command::Extract { traversal } = cli.command else {
            panic!("expected extract command");
        };
        let request = traversal.to_request();
        assert!(request.root_page_urls.is_none());
        assert_eq!(request.max_depth, Some(2));
    }

    #[test]
    fn global_flags_parse_anywhere() {
        let cli = Cli::try_parse_from(["docground", "config", "show", "-vv", "--log-format", "json"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
