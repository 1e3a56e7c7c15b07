//! Binary entry point for tally.
//!
//! This binary provides the CLI interface for the tally ledger.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for error reporting
#![allow(clippy::print_stderr)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tally::cli::{OutputFormat, RecordCommands};
use tally::config::CONFIG_PATH_ENV;
use tally::models::RecordType;
use tally::observability::{self, LoggingConfig};
use tally::storage::{RecordStore, install_global};
use tally::{Error, TallyConfig};

/// Tally - a personal income and expense ledger.
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory.
    #[arg(long, global = true, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Record an income or expense.
    Add {
        /// What the money was for.
        title: String,

        /// Positive amount.
        amount: String,

        /// `income` or `expense`.
        #[arg(short = 't', long = "type", default_value = "expense")]
        record_type: RecordType,
    },

    /// List active records, newest first.
    List {
        /// Match titles (case-insensitive) or amounts containing this text.
        query: Option<String>,

        /// Only show `income` or `expense`.
        #[arg(short = 't', long = "type")]
        record_type: Option<RecordType>,
    },

    /// List records in the trash.
    Trash {
        /// Match titles (case-insensitive) or amounts containing this text.
        query: Option<String>,

        /// Only show `income` or `expense`.
        #[arg(short = 't', long = "type")]
        record_type: Option<RecordType>,
    },

    /// Show one record.
    Show {
        /// Record id.
        id: String,
    },

    /// Change a record's title or amount.
    Edit {
        /// Record id.
        id: String,

        /// New title.
        #[arg(long)]
        title: Option<String>,

        /// New amount.
        #[arg(long)]
        amount: Option<String>,
    },

    /// Move a record to the trash.
    Delete {
        /// Record id.
        id: String,
    },

    /// Take a record out of the trash.
    Restore {
        /// Record id.
        id: String,
    },

    /// Show storage status and record counts.
    Status,
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };
    if let Some(data_dir) = cli.data_dir.clone() {
        config = config.with_data_dir(data_dir);
    }

    let logging = LoggingConfig::from_settings(Some(&config.logging), cli.verbose);
    if let Err(e) = observability::init(&logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(cli: Cli, config: &TallyConfig) -> tally::Result<()> {
    let handle = install_global(config)?;

    // Status reports on unavailable storage instead of failing.
    let needs_store = !matches!(cli.command, Commands::Status);
    if needs_store {
        handle.ensure_supported()?;
    }
    handle.initialize()?;

    let commands = RecordCommands::new(RecordStore::new(handle), cli.format);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Add {
            title,
            amount,
            record_type,
        } => commands
            .add(&mut out, &title, &amount, record_type)
            .await
            .map(drop),
        Commands::List { query, record_type } => commands
            .list(&mut out, query.as_deref(), record_type)
            .await
            .map(drop),
        Commands::Trash { query, record_type } => commands
            .trash(&mut out, query.as_deref(), record_type)
            .await
            .map(drop),
        Commands::Show { id } => commands.show(&mut out, &id).await.map(drop),
        Commands::Edit { id, title, amount } => commands
            .edit(&mut out, &id, title.as_deref(), amount.as_deref())
            .await
            .map(drop),
        Commands::Delete { id } => commands.delete(&mut out, &id).await.map(drop),
        Commands::Restore { id } => commands.restore(&mut out, &id).await.map(drop),
        Commands::Status => commands.status(&mut out).await.map(drop),
    }?;

    out.flush().map_err(|e| Error::OperationFailed {
        operation: "flush_stdout".to_string(),
        cause: e.to_string(),
    })
}

/// Loads configuration.
fn load_config(path: Option<&Path>) -> tally::Result<TallyConfig> {
    if let Some(config_path) = path {
        return TallyConfig::load_from_file(config_path);
    }

    // Environment override for config path
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        if !config_path.trim().is_empty() {
            return TallyConfig::load_from_file(Path::new(&config_path));
        }
    }

    Ok(TallyConfig::load_default())
}
