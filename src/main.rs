use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use breakout_scanner::ScanConfig;
use breakout_scanner::market::PolygonProvider;
use breakout_scanner::scan::{DEFAULT_UNIVERSE, JsonLinesSink, ResultSink, Scanner, TaskStore};

#[derive(Parser)]
#[command(
    name = "breakout-scan",
    version,
    about = "Scan symbols for setups sitting just under a breakout trigger"
)]
struct Cli {
    /// Tickers to scan (defaults to a small large-cap universe)
    symbols: Vec<String>,

    /// Polygon.io API key
    #[arg(long, env = "POLYGON_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Concurrent fetches; overrides SCAN_MAX_CONCURRENCY
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print at most this many candidates
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ScanConfig::from_env();
    if let Some(n) = cli.concurrency {
        config.max_concurrency = n;
    }

    let symbols: Vec<String> = if cli.symbols.is_empty() {
        DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect()
    } else {
        cli.symbols.iter().map(|s| s.trim().to_uppercase()).collect()
    };

    let provider = PolygonProvider::new(cli.api_key).context("create polygon provider")?;
    let scanner = Scanner::new(Arc::new(provider), config).context("invalid scan configuration")?;

    let store = TaskStore::new();
    let task_id = store.create(symbols);
    info!(task_id = %task_id, "starting scan");

    let mut report = scanner.run_tracked(&store, &task_id).await?;
    if let Some(limit) = cli.limit {
        report.results.truncate(limit);
    }

    let sink = JsonLinesSink::new(io::stdout());
    sink.append(&report.results).context("write results")?;

    if let Some(task) = store.get(&task_id) {
        info!(
            task_id = %task.id,
            status = ?task.status,
            candidates = report.results.len(),
            failed = report.failed,
            "scan done"
        );
        if let Some(error) = task.error {
            anyhow::bail!(error);
        }
    }
    Ok(())
}
