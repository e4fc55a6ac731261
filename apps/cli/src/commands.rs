//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use magedocs_core::{AdapterRegistry, Indexer, IndexingObserver, SilentObserver};
use magedocs_mcp::{DocsServer, DocsTools};
use magedocs_shared::{
    AppConfig, IndexingResult, SourceFilter, SourceId, init_config, load_config, load_config_from,
};
use magedocs_storage::DocumentStore;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// magedocs: local full-text index of MageOS, Hyvä and Satoshi documentation.
#[derive(Parser)]
#[command(
    name = "magedocs",
    version,
    about = "Index MageOS, Hyvä and Satoshi documentation and serve it over MCP.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.magedocs/magedocs.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database path, overriding config and MAGEDOCS_DB_PATH.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the source adapters once and exit.
    Update {
        /// Comma-separated sources (mageos, hyva, satoshi). Defaults to all.
        #[arg(long)]
        sources: Option<String>,
    },

    /// Serve the MCP tools over stdio.
    Serve {
        /// Index before serving.
        #[arg(long)]
        update_on_start: bool,

        /// Schedule periodic refreshes; the expression defaults to `server.cron`.
        #[arg(long, value_name = "EXPR")]
        cron: Option<Option<String>>,

        /// Sources indexed on start. Defaults to all.
        #[arg(long)]
        sources: Option<String>,
    },

    /// Show indexed document counts per source.
    Status,

    /// Search the index from the terminal.
    Search {
        query: String,

        /// all, mageos, hyva or satoshi.
        #[arg(long, default_value = "all")]
        source: String,

        /// Maximum number of results (1-50).
        #[arg(long)]
        limit: Option<usize>,
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

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries MCP traffic.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "magedocs=info",
        1 => "magedocs=debug",
        _ => "magedocs=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
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
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&cli),
        };
    }

    let config = resolve_config(&cli)?;
    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => config.db_path()?,
    };

    match cli.command {
        Command::Update { sources } => cmd_update(&config, db_path, sources.as_deref()).await,
        Command::Serve {
            update_on_start,
            cron,
            sources,
        } => {
            let cron = cron.map(|expr| expr.unwrap_or_else(|| config.server.cron.clone()));
            let update_on_start = update_on_start || config.server.update_on_start;
            cmd_serve(&config, db_path, update_on_start, cron, sources.as_deref()).await
        }
        Command::Status => cmd_status(db_path).await,
        Command::Search {
            query,
            source,
            limit,
        } => cmd_search(db_path, &query, &source, limit).await,
        Command::Config { .. } => Ok(()),
    }
}

/// Config file (explicit or default location), then environment overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => {
            let mut config = load_config_from(path)?;
            config.apply_env_overrides(|name| std::env::var(name).ok())?;
            config
        }
        None => load_config()?,
    };
    Ok(config)
}

fn parse_sources(value: Option<&str>) -> Result<Option<Vec<SourceId>>> {
    Ok(match value {
        Some(value) => SourceId::parse_list(value)?,
        None => None,
    })
}

async fn open_store(db_path: &Path) -> Result<Arc<DocumentStore>> {
    let store = DocumentStore::open(db_path)
        .await
        .map_err(|e| eyre!("cannot open database {}: {e}", db_path.display()))?;
    Ok(Arc::new(store))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_update(config: &AppConfig, db_path: PathBuf, sources: Option<&str>) -> Result<()> {
    let sources = parse_sources(sources)?;
    let store = open_store(&db_path).await?;
    let indexer = Indexer::new(store, AdapterRegistry::from_config(config)?);

    info!(db = %db_path.display(), "updating documentation index");

    let reporter = CliProgress::new();
    let results = indexer.run(sources.as_deref(), &reporter).await;
    reporter.finish();

    println!();
    println!("  Documentation index updated!");
    for result in &results {
        println!(
            "  {:<8} processed {:>4}  new {:>4}  updated {:>4}  unchanged {:>4}  failed {:>3}  ({:.1}s)",
            result.source.as_str(),
            result.processed,
            result.inserted,
            result.updated,
            result.skipped,
            result.failed,
            result.duration.as_secs_f64()
        );
    }
    println!("  Database: {}", db_path.display());
    println!();

    Ok(())
}

async fn cmd_serve(
    config: &AppConfig,
    db_path: PathBuf,
    update_on_start: bool,
    cron: Option<String>,
    sources: Option<&str>,
) -> Result<()> {
    let sources = parse_sources(sources)?;
    let store = open_store(&db_path).await?;
    let indexer = Arc::new(Indexer::new(
        store.clone(),
        AdapterRegistry::from_config(config)?,
    ));

    let initial_update = update_on_start.then(|| {
        let indexer = indexer.clone();
        tokio::spawn(async move {
            info!("initial update started");
            indexer.run(sources.as_deref(), &SilentObserver).await;
        })
    });

    let mut scheduler = match cron {
        Some(expression) => Some(start_scheduler(&expression, indexer.clone()).await?),
        None => None,
    };

    let tools = DocsTools::new(store, &db_path).with_indexer(indexer);
    info!(db = %db_path.display(), "MCP server starting");
    let served = DocsServer::new(Arc::new(tools)).serve_stdio().await;

    if let Some(task) = initial_update {
        task.abort();
    }
    if let Some(scheduler) = scheduler.as_mut() {
        scheduler.shutdown().await?;
    }
    served?;
    Ok(())
}

/// Periodic full refreshes. Runs share the indexer's lock with tool-triggered refreshes.
async fn start_scheduler(expression: &str, indexer: Arc<Indexer>) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(expression, move |_uuid, _lock| {
        let indexer = indexer.clone();
        Box::pin(async move {
            info!("scheduled update started");
            let results = indexer.run(None, &SilentObserver).await;
            let failed: usize = results.iter().map(|r| r.failed).sum();
            if failed > 0 {
                error!(failed, "scheduled update finished with failures");
            }
        })
    })
    .map_err(|e| eyre!("invalid cron expression '{expression}': {e}"))?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(expression, "cron updates scheduled");
    Ok(scheduler)
}

async fn cmd_status(db_path: PathBuf) -> Result<()> {
    let tools = DocsTools::new(open_store(&db_path).await?, db_path);
    println!("{}", tools.docs_status().await?.render());
    Ok(())
}

async fn cmd_search(
    db_path: PathBuf,
    query: &str,
    source: &str,
    limit: Option<usize>,
) -> Result<()> {
    let source: SourceFilter = source.parse()?;
    let tools = DocsTools::new(open_store(&db_path).await?, db_path);
    let response = tools.search_docs(query, source, limit).await?;
    println!("{}", response.render());
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> Result<()> {
    let mut config = resolve_config(cli)?;
    if let Some(db) = &cli.db {
        config.storage.db_path = Some(db.display().to_string());
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl IndexingObserver for CliProgress {
    fn on_start(&self, _source: SourceId, description: &str) {
        self.spinner.set_message(format!("Indexing {description}"));
    }

    fn on_result(&self, result: &IndexingResult) {
        self.spinner.println(format!(
            "  ✓ {} ({} documents)",
            result.source, result.processed
        ));
    }
}
