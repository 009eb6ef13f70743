//! Candle (OHLCV) data structure and the per-symbol daily series

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Represents a single daily bar with OHLCV data and timestamp.
///
/// The timestamp is stored as Unix time in milliseconds, which is the format
/// the aggregate endpoints of most equity data vendors (Polygon, Alpaca) use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Unix timestamp in milliseconds (bar open time)
    #[serde(rename = "t")]
    timestamp: i64,
    #[serde(rename = "o")]
    open: f64,
    #[serde(rename = "h")]
    high: f64,
    #[serde(rename = "l")]
    low: f64,
    #[serde(rename = "c")]
    close: f64,
    #[serde(rename = "v")]
    volume: f64,
}

impl Candle {
    /// Creates a new Candle.
    ///
    /// No validation happens here; `CandleSeries::new` checks bar invariants
    /// when a series is ingested. Use `0` for the timestamp in tests.
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns the candle's timestamp (Unix time in milliseconds).
    pub fn get_timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn get_open(&self) -> f64 {
        self.open
    }

    pub fn get_high(&self) -> f64 {
        self.high
    }

    pub fn get_low(&self) -> f64 {
        self.low
    }

    pub fn get_close(&self) -> f64 {
        self.close
    }

    pub fn get_volume(&self) -> f64 {
        self.volume
    }

    /// Returns the full range of the candle (high - low).
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Range as a percentage of the close. Zero if the close is not positive.
    pub fn range_pct(&self) -> f64 {
        if self.close > 0.0 {
            self.range() / self.close * 100.0
        } else {
            0.0
        }
    }

    /// Returns true for an up day (close >= open).
    ///
    /// Unchanged days count as up days for volume accounting.
    pub fn is_up_day(&self) -> bool {
        self.close >= self.open
    }

    /// Returns true if this candle's range sits within `parent`'s range.
    pub fn is_inside(&self, parent: &Candle) -> bool {
        self.high <= parent.high && self.low >= parent.low
    }

    /// Checks the bar invariants, returning the first violated rule.
    pub fn check(&self) -> Result<(), &'static str> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite()) || !self.volume.is_finite() {
            return Err("non-finite value");
        }
        if prices.iter().any(|&p| p <= 0.0) {
            return Err("non-positive price");
        }
        if self.volume < 0.0 {
            return Err("negative volume");
        }
        if self.high < self.open.max(self.close) {
            return Err("high below body");
        }
        if self.low > self.open.min(self.close) {
            return Err("low above body");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("malformed candle at index {index}: {reason}")]
    Malformed { index: usize, reason: &'static str },

    #[error("timestamp at index {index} does not increase")]
    OutOfOrder { index: usize },
}

/// Chronological daily bars for one symbol.
///
/// Calendar gaps (weekends, holidays) are expected and never filled.
#[derive(Debug, Clone, Default)]
pub struct CandleSeries {
    symbol: String,
    candles: Vec<Candle>,
}

impl CandleSeries {
    /// Builds a series, rejecting it if any bar breaks an invariant.
    pub fn new(symbol: impl Into<String>, candles: Vec<Candle>) -> Result<Self, CandleError> {
        for (index, candle) in candles.iter().enumerate() {
            candle
                .check()
                .map_err(|reason| CandleError::Malformed { index, reason })?;
            if index > 0 && candle.timestamp <= candles[index - 1].timestamp {
                return Err(CandleError::OutOfOrder { index });
            }
        }

        Ok(Self {
            symbol: symbol.into(),
            candles,
        })
    }

    /// Builds a series, dropping (and logging) offending bars instead of failing.
    pub fn sanitized(symbol: impl Into<String>, candles: Vec<Candle>) -> Self {
        let symbol = symbol.into();
        let mut kept: Vec<Candle> = Vec::with_capacity(candles.len());

        for (index, candle) in candles.into_iter().enumerate() {
            if let Err(reason) = candle.check() {
                warn!(symbol = %symbol, index, reason, "dropping malformed candle");
                continue;
            }
            if let Some(prev) = kept.last() {
                if candle.timestamp <= prev.timestamp {
                    warn!(symbol = %symbol, index, "dropping out-of-order candle");
                    continue;
                }
            }
            kept.push(candle);
        }

        Self {
            symbol,
            candles: kept,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.get_close()).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.get_volume()).collect()
    }
}

impl AsRef<[Candle]> for CandleSeries {
    fn as_ref(&self) -> &[Candle] {
        &self.candles
    }
}
