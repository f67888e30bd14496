use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use path_rewrite_core::{
    ColumnAllowList, RewriteRequest, RunMode, RunResult, RunStatus, render_header, render_text,
    substitution_warnings,
};
use path_rewrite_db::{BackupSet, DatabaseError, DatabaseLocation, RewriteConfig, backup_database};
use path_rewrite_sqlite::RewriteEngine;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: i32 = 1;
const EXIT_USAGE: i32 = 2;

/// CLI-specific output format enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum CliOutputFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "path-rewrite")]
#[command(about = "Rewrite base path segments inside a media library SQLite database")]
#[command(
    after_help = "Run with --dry-run first, then for real with the media server stopped."
)]
struct Cli {
    /// Directory containing the library database file.
    #[arg(long)]
    db_dir: Option<PathBuf>,
    /// Path to the library database file (overrides --db-dir).
    #[arg(long)]
    db_file: Option<PathBuf>,
    /// Old path segment to replace (e.g. 'archive-media' or '/archive-media/').
    #[arg(long)]
    old: String,
    /// New segment (e.g. 'media' or '/media/').
    #[arg(long)]
    new: String,
    /// Preview changes without modifying the database.
    #[arg(long)]
    dry_run: bool,
    /// YAML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Column name eligible for rewriting; repeat to list several (overrides the config).
    #[arg(long = "column", value_name = "NAME")]
    columns: Vec<String>,
    /// Output format.
    #[arg(long, default_value = "text")]
    format: CliOutputFormat,
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Why a run ended unsuccessfully, and which exit code that maps to.
#[derive(Debug)]
enum Failure {
    /// Invalid invocation; nothing was opened or written.
    Usage(String),
    /// The run started but could not complete.
    Runtime(String),
}

impl Failure {
    fn exit_code(&self) -> i32 {
        match self {
            Failure::Usage(_) => EXIT_USAGE,
            Failure::Runtime(_) => EXIT_FAILURE,
        }
    }

    fn message(&self) -> &str {
        match self {
            Failure::Usage(message) | Failure::Runtime(message) => message,
        }
    }
}

/// Everything `--format json` prints.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    database: &'a Path,
    backup: Option<&'a BackupSet>,
    warnings: Vec<String>,
    result: &'a RunResult,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match run(cli) {
        Ok(code) => code,
        Err(failure) => {
            eprintln!("error: {}", failure.message());
            failure.exit_code()
        }
    };
    std::process::exit(code);
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<i32, Failure> {
    let location = DatabaseLocation::from_args(cli.db_dir, cli.db_file).map_err(|err| match err {
        DatabaseError::MissingLocation => Failure::Usage("Provide --db-dir or --db-file".to_string()),
        other => Failure::Runtime(other.to_string()),
    })?;

    let mode = if cli.dry_run {
        RunMode::DryRun
    } else {
        RunMode::Apply
    };
    let request =
        RewriteRequest::new(cli.old, cli.new, mode).map_err(|e| Failure::Usage(e.to_string()))?;

    let config = match &cli.config {
        Some(path) => RewriteConfig::load(path).map_err(|err| {
            Failure::Runtime(format!("Failed to load config '{}': {err}", path.display()))
        })?,
        None => RewriteConfig::default(),
    };
    let allow_list = if cli.columns.is_empty() {
        config.candidate_columns.clone()
    } else {
        ColumnAllowList::new(cli.columns).map_err(|e| Failure::Usage(e.to_string()))?
    };

    let db_path = location
        .resolve(&config.database_file)
        .map_err(|e| Failure::Runtime(e.to_string()))?;

    let text = cli.format == CliOutputFormat::Text;
    let warnings: Vec<String> = substitution_warnings(&request)
        .iter()
        .map(ToString::to_string)
        .collect();

    if text {
        print!("{}", render_header(&db_path.display().to_string(), &request));
        for warning in &warnings {
            eprintln!("warning: {warning}");
        }
    }

    let backup = if request.is_dry_run() {
        None
    } else {
        let set = backup_database(&db_path, &config.backup_dir)
            .map_err(|e| Failure::Runtime(format!("Backup failed: {e}")))?;
        if text {
            println!("Backed up:");
            for path in set.destinations() {
                println!("  {}", path.display());
            }
        }
        Some(set)
    };

    let engine = RewriteEngine::new(&db_path, allow_list);
    let result = engine
        .run(&request)
        .map_err(|e| Failure::Runtime(e.to_string()))?;

    if text {
        print!("{}", render_text(&result));
    } else {
        let report = JsonReport {
            database: &db_path,
            backup: backup.as_ref(),
            warnings,
            result: &result,
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| Failure::Runtime(format!("Failed to serialize report: {e}")))?;
        println!("{json}");
    }

    Ok(finish(&result, text))
}

/// Prints the closing line for `result` and returns the process exit code.
fn finish(result: &RunResult, text: bool) -> i32 {
    match result.status {
        RunStatus::Previewed => 0,
        RunStatus::Committed => {
            if text {
                println!("\nDone. Restart the media server and refresh libraries if needed.");
            }
            0
        }
        RunStatus::RolledBack => {
            eprintln!("Integrity check failed; rolling back.");
            EXIT_FAILURE
        }
        RunStatus::Aborted => {
            eprintln!("Run aborted: SQLite discarded the transaction; no changes were committed.");
            EXIT_FAILURE
        }
    }
}
