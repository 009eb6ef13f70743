//! DataProvider trait for vendor-specific daily bar access.

use std::future::Future;

use chrono::NaiveDate;
use thiserror::Error;

use crate::indicators::candle::CandleSeries;

// Implementations retry internally; an error here means retries are exhausted
// or the request can never succeed.

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Rate limiting, server errors or timeouts that outlasted the retries.
    #[error("transient provider failure after {attempts} attempts: {reason}")]
    Transient { attempts: u32, reason: String },

    /// Bad symbol, bad request or auth failure. Never retried.
    #[error("permanent provider failure: {0}")]
    Permanent(String),

    /// The vendor answered with a payload we could not read.
    #[error("undecodable provider response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Transient { .. })
    }
}

/// Source of daily candles and market capitalisation.
pub trait DataProvider: Send + Sync + 'static {
    /// Daily bars for `symbol` between `from` and `to`, both inclusive.
    ///
    /// A valid symbol with no data yields an empty series, not an error.
    fn fetch_daily_candles(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = Result<CandleSeries, ProviderError>> + Send;

    /// Market capitalisation in USD, `None` when unknown.
    fn fetch_market_cap(
        &self,
        symbol: &str,
    ) -> impl Future<Output = Result<Option<f64>, ProviderError>> + Send;

    fn name(&self) -> &'static str;
}
