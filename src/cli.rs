//! CLI argument parsing for pipe-run

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::sort::SortDirection;

#[derive(Parser, Debug)]
#[command(name = "pipe-run")]
#[command(author, version, about = "Search, sort, page, validate and export record sets", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a .pipe file against a JSON array of records
    Run {
        /// Pipeline file
        #[arg(required = true)]
        pipeline: PathBuf,

        /// JSON records file
        #[arg(required = true)]
        records: PathBuf,

        /// Write output here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: OutputFormat,

        /// Column separator (default from config)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Print per-stage record counts
        #[arg(short, long)]
        trace: bool,
    },

    /// Search, filter, sort and page records in one step
    Query {
        /// JSON records file
        #[arg(required = true)]
        records: PathBuf,

        /// Case-insensitive text to look for
        #[arg(short, long, default_value = "")]
        search: String,

        /// Fields searched (comma separated)
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Exact match, as field=value (repeatable)
        #[arg(long = "where", value_parser = parse_key_value)]
        filters: Vec<(String, String)>,

        /// Field holding the date for --from/--to
        #[arg(long)]
        date_field: Option<String>,

        /// Earliest date (inclusive)
        #[arg(long)]
        from: Option<String>,

        /// Latest date (inclusive)
        #[arg(long)]
        to: Option<String>,

        /// Field to sort by
        #[arg(long)]
        sort: Option<String>,

        /// Sort direction
        #[arg(long, default_value = "asc")]
        direction: SortDirection,

        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Page size (default from config)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Check a record against a rule set
    Validate {
        /// YAML or JSON rule set
        #[arg(required = true)]
        rules: PathBuf,

        /// JSON record
        #[arg(required = true)]
        record: PathBuf,
    },

    /// Write records to <dir>/<name>.csv
    Export {
        /// JSON records file
        #[arg(required = true)]
        records: PathBuf,

        /// File name without extension
        #[arg(required = true)]
        name: String,

        /// Output directory (default from config)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Column separator (default from config)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Show the stored session
    Session {
        /// Sign out: remove the stored session
        #[arg(long)]
        clear: bool,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected field=value, got '{s}'"))
}
