//! Tight-base consolidation: a narrow multi-month range with contracting ATR

use crate::indicators::candle::Candle;
use crate::indicators::volatility::{DEFAULT_ATR_PERIOD, atr};

pub const DEFAULT_BASE_LOOKBACK: usize = 120;
pub const DEFAULT_MAX_RANGE_PCT: f64 = 25.0;

/// Bars of ATR compared for contraction, split into two equal halves.
const CONTRACTION_WINDOW: usize = 60;
/// Extra history required beyond the lookback.
const HISTORY_MARGIN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TightBase {
    pub ok: bool,
    /// (highest high - lowest low) / lowest low * 100 over the lookback
    pub range_pct: f64,
    /// Mean ATR of the latest 30 bars is below the mean of the 30 before
    pub atr_down: bool,
}

/// Detects a tight base over the most recent `lookback` bars.
///
/// Needs at least `lookback + 10` candles; with less history the verdict is
/// simply negative with a zero range.
pub fn detect_tight_base(candles: &[Candle], lookback: usize, max_range_pct: f64) -> TightBase {
    if lookback == 0 || candles.len() < lookback + HISTORY_MARGIN {
        return TightBase::default();
    }

    let window = &candles[candles.len() - lookback..];
    let highest = window.iter().map(|c| c.get_high()).fold(f64::MIN, f64::max);
    let lowest = window.iter().map(|c| c.get_low()).fold(f64::MAX, f64::min);
    let range_pct = (highest - lowest) / lowest * 100.0;

    let atr_down = atr_contracting(candles);

    TightBase {
        ok: range_pct < max_range_pct && atr_down,
        range_pct,
        atr_down,
    }
}

fn atr_contracting(candles: &[Candle]) -> bool {
    let series = atr(candles, DEFAULT_ATR_PERIOD);
    if series.len() < CONTRACTION_WINDOW {
        return false;
    }

    let half = CONTRACTION_WINDOW / 2;
    let recent = &series[series.len() - CONTRACTION_WINDOW..];
    let first: f64 = recent[..half].iter().sum::<f64>() / half as f64;
    let second: f64 = recent[half..].iter().sum::<f64>() / half as f64;
    second < first
}
