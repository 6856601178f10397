//! CLI parse: clap types for hash_db. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hash_db - content-hash integrity database for a directory tree
#[derive(Parser, Debug)]
#[command(name = "hash_db", version)]
#[command(about = "Track, update and verify content hashes of a directory tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory to operate on; the database is searched for here and in parents
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Compute and report changes without writing the database
    #[arg(long, short = 'n')]
    pub pretend: bool,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Disable logging
    #[arg(long, short = 'q')]
    pub quiet: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stderr, stdout, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a database for the root directory and hash everything in it
    Init {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },
    /// Add new files, drop removed ones, and re-hash files whose size or mtime changed
    Update {
        /// Re-hash every file, ignoring size and mtime
        #[arg(long)]
        rehash: bool,
    },
    /// Import digests from a sha512sum-style hash list
    Import {
        /// Hash list file; relative paths in it are resolved against its directory
        file: PathBuf,

        /// Text encoding of the hash list (WHATWG label, e.g. utf-8, latin1)
        #[arg(long, default_value = "utf-8")]
        encoding: String,
    },
    /// Re-hash every tracked file and compare against the database
    Verify {
        /// List every checked file, not only problems
        #[arg(long, short = 'v')]
        verbose: bool,
    },
    /// Show files whose size or mtime changed since the last update, without hashing
    Status,
    /// Print the database as a sha512sum-style hash list
    Export,
}
