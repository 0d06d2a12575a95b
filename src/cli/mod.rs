//! CLI definitions and entry point.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Bulk employee and SIM card import with a self-extending reference catalog
#[derive(Parser, Debug)]
#[command(name = "roster", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (auto-discover .roster/roster.db if not set)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Actor name recorded on created and updated records
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// `SQLite` busy timeout in ms
    #[arg(long, global = true)]
    pub lock_timeout: Option<u64>,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a roster workspace
    Init {
        /// Overwrite existing DB
        #[arg(long)]
        force: bool,
    },

    /// Import a batch of rows from a JSON array or JSON Lines file
    Import {
        /// What the rows describe
        #[arg(value_enum)]
        target: ImportTarget,

        /// Input file ("-" reads stdin). Blank JSON Lines are skipped and
        /// rows are numbered by record, not by line
        file: PathBuf,

        /// Run the full pipeline without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Parent for new child catalog entries when the batch suggests none
        #[arg(long)]
        default_parent: Option<String>,
    },

    /// Show the reference catalog
    Catalog {
        /// Only show one kind (e.g. department, sub-department, cost-center)
        #[arg(long)]
        kind: Option<String>,
    },

    /// List stored records
    List {
        #[arg(value_enum)]
        target: ListTarget,
    },
}

/// Row type accepted by `roster import`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportTarget {
    Employees,
    SimCards,
}

/// Record set shown by `roster list`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListTarget {
    Employees,
    SimCards,
    Assignments,
}
