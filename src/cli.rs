use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use streamstats::timeseries::Granularity;

/// Streaming catalogue analytics from a SQL warehouse
#[derive(Parser, Debug)]
#[command(name = "streamstats", version)]
#[command(about = "Chart data for streaming catalogue additions, ratings, scores and runtimes", long_about = None)]
pub struct Cli {
    /// Config file (defaults to the platform config dir's streamstats/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Warehouse connection URL (sqlite:// or postgres://)
    #[arg(long, global = true, value_name = "URL")]
    pub warehouse_url: Option<String>,

    /// Snapshot store URL (defaults to a SQLite file in the user data dir)
    #[arg(long, global = true, value_name = "URL")]
    pub cache_url: Option<String>,

    /// Keep the dataset in memory only; never read or write snapshots
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Ignore cached data and query the warehouse
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the services, content types and date bounds available for filtering
    Options,
    /// Titles added over time, per streaming service
    Additions {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Every chart's data as JSON
    Charts {
        #[command(flatten)]
        filters: FilterArgs,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Inspect or clear the local snapshot store
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Streaming service to include (repeatable; default: all)
    #[arg(long = "service", value_name = "NAME")]
    pub services: Vec<String>,

    /// Content type to include, e.g. "Movie" or "TV Show" (repeatable; default: all)
    #[arg(long = "type", value_name = "TYPE")]
    pub content_types: Vec<String>,

    /// First added date to include (default: earliest available)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub start: Option<NaiveDate>,

    /// Last added date to include (default: latest available)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub end: Option<NaiveDate>,

    /// Bucket size for the additions time series
    #[arg(long, value_enum)]
    pub granularity: Option<Granularity>,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Show snapshot counts
    Status,
    /// Delete snapshots, optionally only those whose key starts with PREFIX
    Clear {
        #[arg(long)]
        prefix: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
