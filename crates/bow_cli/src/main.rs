//! bow CLI
//!
//! Command-line tools for bow database files.
//!
//! # Commands
//!
//! - `inspect` - Display file statistics and buckets
//! - `buckets` - List bucket names
//! - `dump` - Print every record of a bucket as JSON
//! - `put` - Store a JSON document
//! - `get` - Print one record as JSON
//! - `compact` - Rewrite the file keeping only live data

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// bow command-line database tools.
#[derive(Parser)]
#[command(name = "bow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Database option as key=value (codec, mode, lock_timeout_ms, ...)
    #[arg(global = true, short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<String>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display file statistics and buckets
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List bucket names in creation order
    Buckets,

    /// Print every record of a bucket as JSON
    Dump {
        /// Bucket name
        bucket: String,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Store a JSON document, keyed by one of its fields
    Put {
        /// Bucket name
        bucket: String,

        /// Field holding the key
        #[arg(short, long)]
        key_field: String,

        /// The document, e.g. '{"id": 1, "name": "x"}'
        document: String,
    },

    /// Print one record as JSON
    Get {
        /// Bucket name
        bucket: String,

        /// Key; parsed as an integer when possible
        key: String,
    },

    /// Rewrite the file keeping only live data
    Compact,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = cli.path.ok_or("Database path required")?;
    let options = &cli.options;

    match cli.command {
        Commands::Inspect { format } => commands::inspect::run(&path, options, &format)?,
        Commands::Buckets => commands::inspect::buckets(&path, options)?,
        Commands::Dump { bucket, limit } => commands::dump::run(&path, options, &bucket, limit)?,
        Commands::Put {
            bucket,
            key_field,
            document,
        } => commands::document::put(&path, options, &bucket, &key_field, &document)?,
        Commands::Get { bucket, key } => commands::document::get(&path, options, &bucket, &key)?,
        Commands::Compact => commands::compact::run(&path, options)?,
    }

    Ok(())
}
