//! Per-symbol pipeline: hard filters, detectors, score and setup type.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ScanConfig;
use crate::indicators::candle::Candle;
use crate::indicators::moving_averages::{avg_volume, ema_last};
use crate::indicators::volatility::adr_pct;
use crate::patterns::consolidation::detect_tight_base;
use crate::patterns::resistance::{TriggerReason, pick_trigger};
use crate::patterns::volume::volume_quality;
use crate::patterns::wedge::detect_higher_lows;
use crate::scoring::breakout_score::{ScoreInputs, score_breakout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetupType {
    FlatTop,
    Wedge,
    /// Reserved; the classifier never produces it.
    Flag,
    Base,
    Unknown,
}

impl SetupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupType::FlatTop => "FLAT_TOP",
            SetupType::Wedge => "WEDGE",
            SetupType::Flag => "FLAG",
            SetupType::Base => "BASE",
            SetupType::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for SetupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A near-breakout candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub symbol: String,
    pub price: f64,
    pub trigger_price: f64,
    pub trigger_reason: TriggerReason,
    /// Absolute percent gap between price and trigger
    pub distance_pct: f64,
    pub adr_pct_14: f64,
    pub ema21: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub avg_vol_50: f64,
    /// Filled in by the universe scanner after the market-cap check
    pub market_cap: Option<f64>,
    pub setup_type: SetupType,
    pub breakout_score: u8,
    pub notes: Vec<String>,
}

/// Why a symbol was filtered out. Rejections are normal control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("insufficient history: {bars} bars, need {required}")]
    InsufficientHistory { bars: usize, required: usize },
    #[error("price not above EMA21/50/200")]
    TrendMisaligned,
    #[error("average volume below floor")]
    Illiquid,
    #[error("ADR% below floor")]
    LowVolatility,
    #[error("no trigger price")]
    NoTriggerResolved,
    #[error("too far from trigger")]
    NotActionable,
}

impl Rejection {
    /// Pipeline stage name, for logs.
    pub fn stage(&self) -> &'static str {
        match self {
            Rejection::InsufficientHistory { .. } => "history",
            Rejection::TrendMisaligned => "trend",
            Rejection::Illiquid => "liquidity",
            Rejection::LowVolatility => "volatility",
            Rejection::NoTriggerResolved => "trigger",
            Rejection::NotActionable => "actionability",
        }
    }
}

/// Fixed priority, first match wins.
fn classify(
    flat_top_touches: usize,
    min_touches: usize,
    higher_lows: bool,
    tight_base: bool,
) -> SetupType {
    if flat_top_touches >= min_touches {
        SetupType::FlatTop
    } else if higher_lows {
        SetupType::Wedge
    } else if tight_base {
        SetupType::Base
    } else {
        SetupType::Unknown
    }
}

/// Runs every stage of the pipeline on one symbol's candles.
///
/// Stages short-circuit in order: history, trend, liquidity, volatility,
/// trigger, actionability. Only a setup that clears all of them is scored.
pub fn evaluate(
    symbol: &str,
    candles: &[Candle],
    config: &ScanConfig,
) -> Result<ScanResult, Rejection> {
    let required = config.min_history_bars.max(1);
    let last = match candles.last() {
        Some(last) if candles.len() >= required => last,
        _ => {
            return Err(Rejection::InsufficientHistory {
                bars: candles.len(),
                required,
            });
        }
    };

    let closes: Vec<f64> = candles.iter().map(|c| c.get_close()).collect();
    let price = last.get_close();
    let ema21 = ema_last(&closes, 21);
    let ema50 = ema_last(&closes, 50);
    let ema200 = ema_last(&closes, 200);

    if !(price > ema21 && price > ema50 && price > ema200) {
        return Err(Rejection::TrendMisaligned);
    }

    let avg_vol_50 = avg_volume(candles, config.volume_period);
    if avg_vol_50 < config.min_avg_volume {
        return Err(Rejection::Illiquid);
    }

    let adr = adr_pct(candles, config.adr_period);
    if adr < config.min_adr_pct {
        return Err(Rejection::LowVolatility);
    }

    let selection = pick_trigger(candles, &config.trigger_params());
    let trigger = selection.trigger.ok_or(Rejection::NoTriggerResolved)?;

    let distance_pct = ((trigger.price - price) / price * 100.0).abs();
    if distance_pct > config.max_distance_pct {
        return Err(Rejection::NotActionable);
    }

    let base = detect_tight_base(candles, config.base_lookback, config.max_base_range_pct);
    let wedge = detect_higher_lows(candles, config.higher_lows_count);
    let volume = volume_quality(candles, config.volume_lookback);

    let score = score_breakout(&ScoreInputs {
        tight_base: base.ok,
        range_pct: base.range_pct,
        atr_down: base.atr_down,
        higher_lows: wedge.ok,
        flat_top_touches: selection.cluster_touches,
        min_flat_top_touches: config.min_cluster_touches,
        volume_ok: volume.ok,
        distance_pct,
    });

    Ok(ScanResult {
        symbol: symbol.to_string(),
        price,
        trigger_price: trigger.price,
        trigger_reason: trigger.reason,
        distance_pct,
        adr_pct_14: adr,
        ema21,
        ema50,
        ema200,
        avg_vol_50,
        market_cap: None,
        setup_type: classify(
            selection.cluster_touches,
            config.min_cluster_touches,
            wedge.ok,
            base.ok,
        ),
        breakout_score: score.score,
        notes: score.notes,
    })
}

/// [`evaluate`] with the rejection logged and dropped.
pub fn scan_one(symbol: &str, candles: &[Candle], config: &ScanConfig) -> Option<ScanResult> {
    match evaluate(symbol, candles, config) {
        Ok(result) => Some(result),
        Err(rejection) => {
            debug!(symbol, stage = rejection.stage(), reason = %rejection, "symbol rejected");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat base with a 101 ceiling touched every 10 bars, finishing at `last_close`.
    fn flat_top(bars: usize, volume: f64, last_close: f64) -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..bars)
            .map(|i| {
                let high = if i % 10 == 5 { 101.0 } else { 100.5 };
                let low = if i + 30 < bars { 98.0 } else { 98.4 };
                Candle::new(i as i64, 99.8, high, low, 100.0, volume)
            })
            .collect();
        let high = last_close.max(100.8) + 0.3;
        candles.push(Candle::new(bars as i64, 100.0, high, 98.4, last_close, volume * 3.0));
        candles
    }

    #[test]
    fn test_flat_top_candidate() {
        let candles = flat_top(300, 2_000_000.0, 100.5);
        let result = evaluate("TEST", &candles, &ScanConfig::default()).unwrap();

        assert_eq!(result.setup_type, SetupType::FlatTop);
        assert_eq!(result.trigger_reason, TriggerReason::FlatTopCluster);
        assert!((result.trigger_price - 101.0).abs() < 1e-9);
        assert!((result.distance_pct - 0.5 / 100.5 * 100.0).abs() < 1e-9);
        assert!(result.breakout_score >= 60);
        assert_eq!(result.market_cap, None);
    }

    /// Same flat base, but only bars 200 and 250 reach the 101 ceiling.
    fn double_top() -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..300)
            .map(|i| {
                let high = if i == 200 || i == 250 { 101.0 } else { 100.5 };
                let low = if i < 270 { 98.0 } else { 98.4 };
                Candle::new(i, 99.8, high, low, 100.0, 2_000_000.0)
            })
            .collect();
        candles.push(Candle::new(300, 100.0, 100.8, 98.4, 100.5, 6_000_000.0));
        candles
    }

    #[test]
    fn test_two_touch_flat_top_when_configured() {
        let candles = double_top();

        let strict = evaluate("TEST", &candles, &ScanConfig::default()).unwrap();
        assert_eq!(strict.trigger_reason, TriggerReason::SwingHigh);
        assert_ne!(strict.setup_type, SetupType::FlatTop);
        assert!(!strict.notes.iter().any(|n| n == "flat top resistance"));

        let config = ScanConfig {
            min_cluster_touches: 2,
            ..Default::default()
        };
        let loose = evaluate("TEST", &candles, &config).unwrap();
        assert_eq!(loose.trigger_reason, TriggerReason::FlatTopCluster);
        assert_eq!(loose.setup_type, SetupType::FlatTop);
        assert!(loose.notes.iter().any(|n| n == "flat top resistance"));
        assert!((loose.trigger_price - strict.trigger_price).abs() < 1e-9);
        // full resistance credit (20) instead of the no-cluster floor (6)
        assert_eq!(loose.breakout_score, strict.breakout_score + 14);
    }

    #[test]
    fn test_short_history_rejected() {
        let candles = flat_top(200, 2_000_000.0, 100.5);
        assert_eq!(
            evaluate("TEST", &candles, &ScanConfig::default()),
            Err(Rejection::InsufficientHistory {
                bars: 201,
                required: 260
            })
        );
        assert_eq!(
            evaluate("TEST", &[], &ScanConfig::default()).map(|_| ()),
            Err(Rejection::InsufficientHistory { bars: 0, required: 260 })
        );
    }

    #[test]
    fn test_price_below_ema_rejected() {
        let candles = flat_top(300, 2_000_000.0, 99.5);
        assert_eq!(
            evaluate("TEST", &candles, &ScanConfig::default()).map(|_| ()),
            Err(Rejection::TrendMisaligned)
        );
    }

    #[test]
    fn test_thin_volume_rejected() {
        let candles = flat_top(300, 500_000.0, 100.5);
        assert_eq!(
            evaluate("TEST", &candles, &ScanConfig::default()).map(|_| ()),
            Err(Rejection::Illiquid)
        );
        assert!(scan_one("TEST", &candles, &ScanConfig::default()).is_none());
    }

    #[test]
    fn test_low_adr_rejected() {
        let config = ScanConfig {
            min_adr_pct: 5.0,
            ..Default::default()
        };
        let candles = flat_top(300, 2_000_000.0, 100.5);
        assert_eq!(
            evaluate("TEST", &candles, &config).map(|_| ()),
            Err(Rejection::LowVolatility)
        );
    }

    #[test]
    fn test_extended_breakout_not_actionable() {
        let candles = flat_top(300, 2_000_000.0, 106.0);
        assert_eq!(
            evaluate("TEST", &candles, &ScanConfig::default()).map(|_| ()),
            Err(Rejection::NotActionable)
        );
    }

    #[test]
    fn test_no_trigger_rejected() {
        // Steady uptrend: highs only ever rise, so no pivot highs and no inside day
        let candles: Vec<Candle> = (0..300)
            .map(|i| {
                let mid = 50.0 + i as f64 * 0.25;
                Candle::new(i, mid - 0.2, mid + 1.5, mid - 1.5, mid + 0.2, 2_000_000.0)
            })
            .collect();
        assert_eq!(
            evaluate("TEST", &candles, &ScanConfig::default()).map(|_| ()),
            Err(Rejection::NoTriggerResolved)
        );
    }

    #[test]
    fn test_classification_priority() {
        assert_eq!(classify(3, 3, true, true), SetupType::FlatTop);
        assert_eq!(classify(2, 3, true, true), SetupType::Wedge);
        assert_eq!(classify(0, 3, false, true), SetupType::Base);
        assert_eq!(classify(0, 3, false, false), SetupType::Unknown);
    }

    #[test]
    fn test_setup_type_wire_names() {
        assert_eq!(serde_json::to_string(&SetupType::FlatTop).unwrap(), "\"FLAT_TOP\"");
        assert_eq!(serde_json::to_string(&SetupType::Flag).unwrap(), "\"FLAG\"");
        let parsed: SetupType = serde_json::from_str("\"WEDGE\"").unwrap();
        assert_eq!(parsed, SetupType::Wedge);
        assert_eq!(SetupType::Base.to_string(), "BASE");
    }
}
