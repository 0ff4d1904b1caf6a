mod cli;
mod output;

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;

use cli::{CacheAction, Cli, Commands, FilterArgs, OutputFormat};
use streamstats::charts::Filters;
use streamstats::config::Config;
use streamstats::db::Database;
use streamstats::types::{ContentType, Dataset};
use streamstats::{current_epoch, StreamStats};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = &cli.warehouse_url { config.warehouse_url = Some(url.clone()); }
    if let Some(url) = &cli.cache_url { config.cache_url = Some(url.clone()); }
    if cli.no_cache { config.use_snapshot_store = false; }
    config.validate()?;

    match cli.command {
        Commands::Cache { action } => run_cache(&config, action).await,
        Commands::Options => {
            let mut app = open(&config, cli.refresh).await?;
            println!("{}", output::render_options(&app.options().await?));
            Ok(())
        }
        Commands::Additions { filters, format } => {
            let mut app = open(&config, cli.refresh).await?;
            let dataset = app.dataset(false).await?;
            let filters = resolve_filters(&filters, &dataset);
            let charts = app.charts(&filters).await?;
            match format {
                OutputFormat::Table => println!("{}", output::render_additions(&charts.additions)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&charts.additions)?),
            }
            Ok(())
        }
        Commands::Charts { filters, pretty } => {
            let mut app = open(&config, cli.refresh).await?;
            let dataset = app.dataset(false).await?;
            let filters = resolve_filters(&filters, &dataset);
            let charts = app.charts(&filters).await?;
            let json = if pretty { serde_json::to_string_pretty(&charts)? } else { serde_json::to_string(&charts)? };
            println!("{json}");
            Ok(())
        }
    }
}

// The warehouse is required: without it there is nothing to show.
async fn open(config: &Config, refresh: bool) -> Result<StreamStats> {
    let mut app = StreamStats::connect(config).await.context("warehouse unavailable")?;
    app.dataset(refresh).await.context("loading catalogue")?;
    Ok(app)
}

async fn run_cache(config: &Config, action: CacheAction) -> Result<()> {
    let db = Database::connect(config.cache_url.as_deref()).await?;
    db.run_migrations().await?;
    match action {
        CacheAction::Status => {
            let stats = db.cache_stats(current_epoch()).await?;
            println!("snapshots: {} ({} expired)", stats.entries, stats.expired);
        }
        CacheAction::Clear { prefix } => {
            let removed = db.clear_cache_prefix(prefix.as_deref()).await?;
            println!("removed {removed} snapshot(s)");
        }
    }
    Ok(())
}

/// Start from "everything" and narrow by whatever the user passed.
fn resolve_filters(args: &FilterArgs, dataset: &Dataset) -> Filters {
    let mut filters = Filters::defaults_for(dataset);
    if !args.services.is_empty() {
        let known = dataset.services();
        filters.services = args.services.iter().cloned().collect::<BTreeSet<_>>();
        for s in filters.services.iter().filter(|s| !known.contains(*s)) {
            warn!(service = %s, "service not present in the catalogue");
        }
    }
    if !args.content_types.is_empty() {
        filters.content_types = args.content_types.iter().map(|t| ContentType::from(t.as_str())).collect();
    }
    if let Some(start) = args.start { filters.range.start = start; }
    if let Some(end) = args.end { filters.range.end = end; }
    if let Some(g) = args.granularity { filters.granularity = g; }
    filters
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("STREAMSTATS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
