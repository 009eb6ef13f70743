//! Polygon.io REST implementation of `DataProvider`.
//! Endpoints: `/v2/aggs` for daily bars, `/v3/reference/tickers` for market cap.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::indicators::candle::{Candle, CandleSeries};
use crate::market::provider::{DataProvider, ProviderError};

pub const POLYGON_BASE_URL: &str = "https://api.polygon.io";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do after one HTTP attempt.
#[derive(Debug, Clone, PartialEq)]
enum Attempt {
    Retry(Duration),
    GiveUp(String),
}

/// Attempt budget and backoff bases for Polygon requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts per request, the first one included
    pub max_tries: u32,
    /// Doubles per attempt on 429
    pub rate_limit_base: Duration,
    /// Doubles per attempt on 500/502/503/504
    pub server_error_base: Duration,
    /// Grows linearly per attempt on timeouts
    pub timeout_base: Duration,
    /// Flat pause after other transport errors
    pub network_pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_tries: 5,
            rate_limit_base: Duration::from_millis(1000),
            server_error_base: Duration::from_millis(500),
            timeout_base: Duration::from_secs(1),
            network_pause: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    /// Decides retry/backoff for a non-success status on attempt `attempt` (0-based).
    ///
    /// 429 backs off hardest, 5xx from a smaller base; any other status is a
    /// request problem that retrying will not fix.
    fn on_status(&self, status: StatusCode, attempt: u32) -> Attempt {
        let doubling = 2u32.saturating_pow(attempt);
        match status.as_u16() {
            429 => Attempt::Retry(self.rate_limit_base * doubling),
            500 | 502 | 503 | 504 => Attempt::Retry(self.server_error_base * doubling),
            code => Attempt::GiveUp(format!("HTTP {code}")),
        }
    }

    /// Backoff after a transport error (no HTTP status).
    fn on_transport_error(&self, is_timeout: bool, attempt: u32) -> Duration {
        if is_timeout {
            self.timeout_base * (1 + attempt)
        } else {
            self.network_pause
        }
    }
}

#[derive(Debug, Deserialize)]
struct AggregatesResponse {
    #[serde(default)]
    results: Vec<AggregateBar>,
}

#[derive(Debug, Deserialize)]
struct AggregateBar {
    #[serde(default)]
    t: i64,
    #[serde(default)]
    o: f64,
    #[serde(default)]
    h: f64,
    #[serde(default)]
    l: f64,
    #[serde(default)]
    c: f64,
    #[serde(default)]
    v: f64,
}

/// Converts an aggregates payload into candles. Missing `results` means no data.
fn parse_aggregates(value: Value) -> Result<Vec<Candle>, ProviderError> {
    let response: AggregatesResponse =
        serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))?;

    Ok(response
        .results
        .into_iter()
        .map(|bar| Candle::new(bar.t, bar.o, bar.h, bar.l, bar.c, bar.v))
        .collect())
}

/// Reads `results.market_cap`; absent, null or zero means unknown.
fn parse_market_cap(value: &Value) -> Option<f64> {
    value
        .get("results")
        .and_then(|r| r.get("market_cap"))
        .and_then(Value::as_f64)
        .filter(|cap| *cap > 0.0)
}

#[derive(Debug, Clone)]
pub struct PolygonProvider {
    http: Client,
    api_key: String,
    base_url: String,
    retry: RetryPolicy,
}

impl PolygonProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .user_agent("breakout-scanner")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Permanent(format!("build http client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: POLYGON_BASE_URL.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Points the provider at another host (proxies, recorded fixtures).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// GET with retries and exponential backoff.
    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        let max_tries = self.retry.max_tries.max(1);
        let mut last_reason = String::from("no attempt made");

        for attempt in 0..max_tries {
            let res = self
                .http
                .get(&url)
                .query(query)
                .query(&[("apiKey", self.api_key.as_str())])
                .send()
                .await;

            let backoff = match res {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .json::<Value>()
                        .await
                        .map_err(|e| ProviderError::Decode(e.to_string()));
                }
                Ok(resp) => match self.retry.on_status(resp.status(), attempt) {
                    Attempt::Retry(backoff) => {
                        last_reason = format!("HTTP {}", resp.status());
                        backoff
                    }
                    Attempt::GiveUp(reason) => {
                        let body = resp.text().await.unwrap_or_default();
                        let snippet: String = body.chars().take(200).collect();
                        return Err(ProviderError::Permanent(format!(
                            "{reason} on {path}: {snippet}"
                        )));
                    }
                },
                Err(e) => {
                    last_reason = format!("request failed: {e}");
                    self.retry.on_transport_error(e.is_timeout(), attempt)
                }
            };

            if attempt + 1 < max_tries {
                debug!(
                    path,
                    attempt,
                    reason = %last_reason,
                    backoff_ms = backoff.as_millis() as u64,
                    "retrying polygon request"
                );
                tokio::time::sleep(backoff).await;
            }
        }

        warn!(path, reason = %last_reason, "polygon request exhausted retries");
        Err(ProviderError::Transient {
            attempts: max_tries,
            reason: last_reason,
        })
    }
}

impl DataProvider for PolygonProvider {
    async fn fetch_daily_candles(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<CandleSeries, ProviderError> {
        let path = format!("/v2/aggs/ticker/{symbol}/range/1/day/{from}/{to}");
        let query = [
            ("adjusted", "true".to_string()),
            ("sort", "asc".to_string()),
            ("limit", "50000".to_string()),
        ];

        let value = self.get_json(&path, &query).await?;
        let candles = parse_aggregates(value)?;
        Ok(CandleSeries::sanitized(symbol, candles))
    }

    async fn fetch_market_cap(&self, symbol: &str) -> Result<Option<f64>, ProviderError> {
        let path = format!("/v3/reference/tickers/{symbol}");
        let value = self.get_json(&path, &[]).await?;
        Ok(parse_market_cap(&value))
    }

    fn name(&self) -> &'static str {
        "Polygon"
    }
}
