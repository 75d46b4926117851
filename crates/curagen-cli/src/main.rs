//! Curagen command-line front end.
//! Validates evidence, scores it, checks schema definitions and walks a
//! curation through the review workflow against an in-memory store.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use curagen_config::Config;

#[derive(Parser, Debug)]
#[command(name = "curagen")]
#[command(about = "Schema-agnostic gene-disease curation toolkit")]
struct Cli {
    /// Configuration file (defaults to ./curagen.toml)
    #[arg(long, global = true, env = "CURAGEN_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Schema catalog directory, overriding catalog.schema_dir
    #[arg(long, global = true, value_name = "DIR")]
    schema_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate an evidence payload against a schema
    Validate {
        /// Schema file, or `name` / `name@version` from the catalog
        #[arg(short, long)]
        schema: String,
        /// Evidence payload (JSON or YAML)
        #[arg(short, long, value_name = "PATH")]
        evidence: PathBuf,
        /// Scope context forwarded to the scoring engine
        #[arg(long, value_name = "PATH")]
        context: Option<PathBuf>,
    },
    /// Score an evidence payload with a named engine
    Score {
        #[arg(long)]
        engine: String,
        #[arg(short, long, value_name = "PATH")]
        evidence: PathBuf,
        /// Take the engine options from this schema's scoring configuration
        #[arg(short, long)]
        schema: Option<String>,
    },
    /// Check a schema definition file for structural problems
    CheckSchema {
        path: PathBuf,
    },
    /// Print the JSON Schema for a curation schema
    JsonSchema {
        schema: String,
    },
    /// List registered scoring engines
    Engines,
    /// Walk a gene-disease curation from entry to activation
    Walkthrough {
        /// Workflow pair name from the catalog (first pair if omitted)
        #[arg(long)]
        pair: Option<String>,
        /// Precuration evidence (JSON or YAML)
        #[arg(long, value_name = "PATH")]
        precuration: PathBuf,
        /// Curation evidence submitted for review
        #[arg(long, value_name = "PATH")]
        curation: PathBuf,
        /// Number of approving peer reviewers
        #[arg(long, default_value_t = 2)]
        reviewers: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = cli.schema_dir {
        config.catalog.schema_dir = dir;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(schema_dir = %config.catalog.schema_dir.display(), "Curagen starting");

    let ctx = commands::Context::new(config);
    let passed = match cli.command {
        Command::Validate { schema, evidence, context } => {
            commands::validate(&ctx, &schema, &evidence, context.as_deref())?
        }
        Command::Score { engine, evidence, schema } => commands::score(&ctx, &engine, &evidence, schema.as_deref())?,
        Command::CheckSchema { path } => commands::check_schema(&ctx, &path)?,
        Command::JsonSchema { schema } => commands::json_schema(&ctx, &schema)?,
        Command::Engines => commands::engines(&ctx)?,
        Command::Walkthrough { pair, precuration, curation, reviewers } => {
            commands::walkthrough(&ctx, pair.as_deref(), &precuration, &curation, reviewers).await?
        }
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}
