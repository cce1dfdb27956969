//! Command-line interface.

pub mod commands;

use crate::config::CliOverrides;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Normalize request-tool export files and import them into a document store.
#[derive(Parser, Debug)]
#[command(name = "arc-import", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output machine-readable JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write JSON logs to this file
    #[arg(long, global = true, value_name = "PATH", env = "ARC_IMPORT_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Settings file (default: ./arc-import.yaml if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Document store database path
    #[arg(long = "db", global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalize a file and store it
    Import(ImportArgs),

    /// Print the detected source format of a file
    Detect(FileArgs),

    /// Print the normalized import bundle of a file
    Normalize(NormalizeArgs),

    /// Show document counts per collection
    Stats,

    /// Emit JSON Schemas of the machine-readable outputs
    Schema(SchemaArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    /// File to read
    pub file: PathBuf,

    /// MIME type of the file, if known
    #[arg(long)]
    pub mime: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Normalize and report without writing to the store
    #[arg(long)]
    pub dry_run: bool,

    /// Items processed between scheduler yields
    #[arg(long, value_name = "N")]
    pub chunk_size: Option<usize>,

    /// Drive file id to stamp onto every request
    #[arg(long, value_name = "ID")]
    pub drive_id: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub input: FileArgs,

    /// Print a summary instead of the bundle
    #[arg(long)]
    pub summary: bool,

    /// Items processed between scheduler yields
    #[arg(long, value_name = "N")]
    pub chunk_size: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Which schema to emit
    #[arg(value_enum, default_value_t = SchemaTarget::All)]
    pub target: SchemaTarget,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaTarget {
    All,
    Bundle,
    Summary,
    Stats,
    Error,
}

impl Cli {
    /// Settings overrides carried by the command line.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        let (chunk_size, dry_run) = match &self.command {
            Commands::Import(args) => (args.chunk_size, args.dry_run.then_some(true)),
            Commands::Normalize(args) => (args.chunk_size, None),
            _ => (None, None),
        };
        CliOverrides {
            config: self.config.clone(),
            database: self.db.clone(),
            chunk_size,
            dry_run,
        }
    }
}
