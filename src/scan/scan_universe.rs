//! Concurrent universe scan over a `DataProvider`.
//!
//! Fetches are gated by a semaphore (`max_concurrency`), preceded by a fixed
//! per-symbol delay and, optionally, a shared pacing clock. A failing symbol
//! is logged and counted; it never stops the others.

use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, ScanConfig};
use crate::market::provider::DataProvider;
use crate::scan::scan_one::{ScanResult, scan_one};
use crate::scan::sink::{ResultSink, SinkError};
use crate::scan::tasks::{TaskError, TaskStore};

pub const DEFAULT_UNIVERSE: [&str; 5] = ["AAPL", "MSFT", "NVDA", "AMZN", "TSLA"];

/// Results plus per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanReport {
    /// Candidates, best score first
    pub results: Vec<ScanResult>,
    pub requested: usize,
    /// Symbols that reached the per-symbol pipeline
    pub evaluated: usize,
    /// Symbols whose candle fetch failed
    pub failed: usize,
    pub below_market_cap: usize,
}

enum Outcome {
    Candidate(ScanResult),
    Rejected,
    BelowMarketCap,
    Failed,
}

pub struct Scanner<P: DataProvider> {
    provider: Arc<P>,
    config: ScanConfig,
    permits: Semaphore,
    /// Earliest instant the next fetch may start
    pacer: Mutex<Instant>,
}

impl<P: DataProvider> Scanner<P> {
    /// Validates `config`; an invalid config is the one error that aborts a scan.
    pub fn new(provider: Arc<P>, config: ScanConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            provider,
            permits: Semaphore::new(config.max_concurrency),
            pacer: Mutex::new(Instant::now()),
            config,
        })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Scans one symbol end to end; `None` on rejection or failure.
    pub async fn scan_one_symbol(&self, symbol: &str) -> Option<ScanResult> {
        match self.process(symbol).await {
            Outcome::Candidate(result) => Some(result),
            _ => None,
        }
    }

    /// Scans every symbol and returns the candidates, best score first.
    pub async fn scan_universe<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<ScanResult> {
        self.scan_universe_report(symbols).await.results
    }

    pub async fn scan_universe_report<S: AsRef<str>>(&self, symbols: &[S]) -> ScanReport {
        let outcomes = join_all(symbols.iter().map(|s| self.process(s.as_ref()))).await;

        let mut report = ScanReport {
            requested: symbols.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Candidate(result) => {
                    report.evaluated += 1;
                    report.results.push(result);
                }
                Outcome::Rejected => report.evaluated += 1,
                Outcome::BelowMarketCap => report.below_market_cap += 1,
                Outcome::Failed => report.failed += 1,
            }
        }

        // stable: equal scores keep arrival order
        report
            .results
            .sort_by(|a, b| b.breakout_score.cmp(&a.breakout_score));

        info!(
            provider = self.provider.name(),
            requested = report.requested,
            evaluated = report.evaluated,
            candidates = report.results.len(),
            failed = report.failed,
            below_market_cap = report.below_market_cap,
            "universe scan finished"
        );
        report
    }

    /// Runs a scan for a task registered in `store`, moving it through its lifecycle.
    ///
    /// The task fails when every requested symbol failed to fetch; otherwise it
    /// completes with the candidates.
    pub async fn run_tracked(
        &self,
        store: &TaskStore,
        task_id: &str,
    ) -> Result<ScanReport, TaskError> {
        let symbols = store.start(task_id)?;
        let report = self.scan_universe_report(&symbols).await;

        if report.requested > 0 && report.failed == report.requested {
            store.fail(task_id, format!("all {} symbols failed to fetch", report.failed))?;
        } else {
            store.complete(task_id, report.results.clone())?;
        }
        Ok(report)
    }

    /// Scans and appends the candidates to `sink`.
    pub async fn scan_into<S: AsRef<str>>(
        &self,
        symbols: &[S],
        sink: &dyn ResultSink,
    ) -> Result<ScanReport, SinkError> {
        let report = self.scan_universe_report(symbols).await;
        sink.append(&report.results)?;
        Ok(report)
    }

    fn window(&self) -> (NaiveDate, NaiveDate) {
        let to = Utc::now().date_naive();
        let from = to
            .checked_sub_signed(TimeDelta::days(self.config.lookback_days))
            .unwrap_or(NaiveDate::MIN);
        (from, to)
    }

    /// Waits for this fetch's slot on the shared pacing clock. No-op when disabled.
    async fn pace(&self) {
        let gap = self.config.min_fetch_gap();
        if gap.is_zero() {
            return;
        }

        let slot = {
            let mut next = self.pacer.lock().await;
            let now = Instant::now();
            let when = if *next > now { *next } else { now };
            *next = when + gap;
            when
        };
        sleep_until(slot).await;
    }

    async fn process(&self, symbol: &str) -> Outcome {
        let (candles, market_cap) = {
            let Ok(_permit) = self.permits.acquire().await else {
                warn!(symbol, "concurrency gate closed");
                return Outcome::Failed;
            };

            let delay = self.config.fetch_delay();
            if !delay.is_zero() {
                sleep(delay).await;
            }
            self.pace().await;

            let (from, to) = self.window();
            debug!(symbol, %from, %to, "fetching");
            tokio::join!(
                self.provider.fetch_daily_candles(symbol, from, to),
                self.provider.fetch_market_cap(symbol),
            )
        };

        let candles = match candles {
            Ok(candles) => candles,
            Err(e) => {
                warn!(symbol, error = %e, transient = e.is_transient(), "candle fetch failed");
                return Outcome::Failed;
            }
        };

        let market_cap = match market_cap {
            Ok(cap) => cap,
            Err(e) => {
                warn!(symbol, error = %e, "market cap unavailable, treating as unknown");
                None
            }
        };

        if market_cap.is_some_and(|cap| cap < self.config.min_market_cap) {
            debug!(symbol, market_cap = ?market_cap, "below market cap floor");
            return Outcome::BelowMarketCap;
        }

        match scan_one(symbol, candles.candles(), &self.config) {
            Some(mut result) => {
                result.market_cap = market_cap;
                Outcome::Candidate(result)
            }
            None => Outcome::Rejected,
        }
    }
}
