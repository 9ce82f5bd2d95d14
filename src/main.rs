mod cli;
mod config;
mod db;
mod embedding;
mod error;
mod knowledge;
mod server;
mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "memory-forge",
    version,
    about = "On-demand semantic knowledge index for AI coding agents"
)]
struct Cli {
    /// Project root (defaults to $MEMORY_FORGE_PROJECT_ROOT, then the
    /// working directory)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP tool server (stdio transport)
    Serve,
    /// Synchronize the index with the knowledge tree
    Index {
        /// Clear the index and rebuild from scratch
        #[arg(long)]
        force: bool,
    },
    /// Alias for `index` without force
    Sync,
    /// Semantic search over the knowledge index
    Query {
        /// The search query
        text: String,
        /// Maximum number of results
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
        /// Minimum adjusted similarity score
        #[arg(long, value_name = "F")]
        threshold: Option<f32>,
        /// Emit results as JSON
        #[arg(long, conflicts_with = "context")]
        json: bool,
        /// Emit results as a plain-text context block
        #[arg(long)]
        context: bool,
        /// At most one result per source file
        #[arg(long)]
        unique: bool,
        /// Comma-separated source types (skill,knowledge)
        #[arg(long = "type", value_name = "T,...")]
        types: Option<String>,
    },
    /// Show index statistics
    Stats,
    /// List indexed files (or preview discovery with --discover)
    List {
        /// Walk the knowledge tree and show what a sync would do
        #[arg(long)]
        discover: bool,
    },
    /// Print the highest-priority chunks up to the preload token budget
    Preload,
    /// Clear the derived index (source files untouched)
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Index health report
    Memory,
    /// Audit autoload files against token thresholds
    Audit,
    /// Forget stale indexed files under configured caps
    Forget {
        /// Keep at most this many files (importance >= 8 always survives)
        #[arg(long, value_name = "N")]
        max_files: Option<usize>,
        /// Forget files not accessed within this many days
        #[arg(long = "max-age", value_name = "D")]
        max_age_days: Option<u32>,
        /// Report what would be forgotten without deleting
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to the cache directory
    Download,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match config::ForgeConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };

    // Log to stderr so stdout stays clean for MCP JSON-RPC and for
    // context output meant to be piped into prompts.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli, config).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e:#}");
            if error::is_fatal(&e) {
                2
            } else {
                1
            }
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli, config: config::ForgeConfig) -> Result<()> {
    let root = config::resolve_project_root(cli.root)?;

    match cli.command {
        Command::Serve => server::serve_stdio(config, root).await?,
        Command::Index { force } => cli::index::index(&config, &root, force)?,
        Command::Sync => cli::index::index(&config, &root, false)?,
        Command::Query {
            text,
            limit,
            threshold,
            json,
            context,
            unique,
            types,
        } => {
            let format = if json {
                cli::query::OutputFormat::Json
            } else if context {
                cli::query::OutputFormat::Context
            } else {
                cli::query::OutputFormat::Human
            };
            cli::query::query(
                &config,
                &root,
                &text,
                limit,
                threshold,
                unique,
                types.as_deref(),
                format,
            )?;
        }
        Command::Stats => cli::stats::stats(&root)?,
        Command::List { discover } => cli::list::list(&root, discover)?,
        Command::Preload => cli::preload::preload(&config, &root)?,
        Command::Clear { yes } => cli::clear::clear(&root, yes)?,
        Command::Memory => cli::memory::memory(&root)?,
        Command::Audit => cli::audit::audit(&root)?,
        Command::Forget {
            max_files,
            max_age_days,
            dry_run,
        } => cli::forget::forget(&config, &root, max_files, max_age_days, dry_run)?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config).await?,
        },
    }

    Ok(())
}
