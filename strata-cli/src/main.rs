//! StrataML CLI - Command-line interface for StrataML workspaces
//!
//! Indexes datasets, runs and models, walks their lineage, and checks the
//! workspace against the StrataML layout and metadata conventions.

use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod constants;
mod output;

use commands::*;
use config::StrataConfig;
use output::OutputFormat;
use strata_core::IndexScope;

/// Metadata engine for ML workspaces.
///
/// StrataML indexes the datasets, training runs and models of a workspace,
/// derives lineage between them, and validates the workspace layout.
#[derive(Parser)]
#[command(name = "strataml")]
#[command(author, version)]
#[command(about = "Index, trace and validate ML workspaces")]
#[command(propagate_version = true)]
#[command(next_help_heading = "Options")]
#[command(after_help = "Examples:
  strataml status                 Summarize the current workspace
  strataml index -o index.json    Write the workspace index
  strataml doctor --strict        Validate, failing on warnings
  strataml lineage clf/v1 --upstream")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the workspace index (datasets, runs, models, lineage)
    #[command(visible_alias = "i")]
    Index {
        /// Workspace root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Only index datasets
        #[arg(long, conflicts_with_all = ["runs", "models"])]
        datasets: bool,

        /// Only index runs
        #[arg(long, conflicts_with = "models")]
        runs: bool,

        /// Only index models
        #[arg(long)]
        models: bool,

        /// Write the index to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate the workspace against the compliance rules
    Doctor {
        /// Workspace root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Treat warnings as failures
        #[arg(long)]
        strict: bool,

        /// Run a single rule (layout, schemas, runs, datasets, models, lfs or 1-5)
        #[arg(short, long)]
        rule: Option<String>,
    },

    /// Show workspace summary and recent runs
    #[command(visible_alias = "st")]
    Status {
        /// Workspace root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// List datasets, runs or models
    #[command(visible_alias = "ls")]
    List {
        /// Category to list
        #[arg(value_enum)]
        category: list::Category,

        /// Workspace root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Show what an artifact was built from or fed into
    Lineage {
        /// Artifact id (run id, or name/version for datasets and models)
        id: String,

        /// Workspace root (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,

        /// Walk towards sources instead of dependents
        #[arg(short, long)]
        upstream: bool,
    },
}

impl Commands {
    /// Workspace root the command operates on.
    fn path(&self) -> &str {
        match self {
            Commands::Index { path, .. }
            | Commands::Doctor { path, .. }
            | Commands::Status { path }
            | Commands::List { path, .. }
            | Commands::Lineage { path, .. } => path.as_str(),
        }
    }
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Handle case where no command is provided
    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(());
        }
    };

    // Load configuration from the workspace's .stratarc.toml
    let config = StrataConfig::load(std::path::Path::new(command.path()));

    // Resolve output format: CLI flag > config default > Table
    let format = cli.format.unwrap_or_else(|| {
        config
            .default_format()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Table)
    });

    if let Some(use_color) = config.use_color() {
        colored::control::set_override(use_color);
    }

    match command {
        Commands::Index {
            path,
            datasets,
            runs,
            models,
            output,
        } => {
            let scope = if datasets {
                IndexScope::Datasets
            } else if runs {
                IndexScope::Runs
            } else if models {
                IndexScope::Models
            } else {
                IndexScope::All
            };
            index::run(&path, scope, output.as_deref(), format)
        }
        Commands::Doctor { path, strict, rule } => {
            let strict = strict || config.strict();
            let code = match doctor::run(
                &path,
                rule.as_deref(),
                strict,
                config.large_file_bytes(),
                format,
            ) {
                Ok(code) => code,
                Err(e) => {
                    // Exit code 1 is reserved for warnings.
                    eprintln!("Error: {:?}", e);
                    2
                }
            };
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Commands::Status { path } => status::run(&path, format),
        Commands::List { category, path } => list::run(&path, category, format),
        Commands::Lineage { id, path, upstream } => lineage::run(&id, &path, upstream, format),
    }
}
