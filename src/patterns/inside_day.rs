//! Inside-day compression: a bar whose range sits within the prior bar's range

use crate::indicators::candle::Candle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsideDay {
    pub inside_high: f64,
    pub inside_low: f64,
    pub parent_index: usize,
}

/// Breakout levels for an inside-day setup on the latest bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsideDayBreakout {
    /// Parent bar high; a close above it breaks the compression upward
    pub breakout_high: f64,
    pub breakout_low: f64,
    pub consecutive: usize,
    pub compression_range: f64,
    pub compression_pct: f64,
}

/// Checks whether the candle at `index` is an inside day.
///
/// Inside day: `high <= parent.high` and `low >= parent.low`. Index 0 has no
/// parent and is never an inside day.
pub fn detect_inside_day(candles: &[Candle], index: usize) -> Option<InsideDay> {
    if index == 0 || index >= candles.len() {
        return None;
    }

    let current = &candles[index];
    let parent = &candles[index - 1];

    current.is_inside(parent).then(|| InsideDay {
        inside_high: current.get_high(),
        inside_low: current.get_low(),
        parent_index: index - 1,
    })
}

/// Counts consecutive inside days walking back from the latest bar.
pub fn count_consecutive_inside_days(candles: &[Candle]) -> usize {
    (1..candles.len())
        .rev()
        .take_while(|&i| detect_inside_day(candles, i).is_some())
        .count()
}

/// The latest bar's high when it is an inside day.
///
/// Used as the second-priority trigger; needs at least three bars.
pub fn inside_day_high(candles: &[Candle]) -> Option<f64> {
    if candles.len() < 3 {
        return None;
    }
    detect_inside_day(candles, candles.len() - 1).map(|d| d.inside_high)
}

/// Breakout levels for an inside day on the latest bar, taken from its parent.
pub fn inside_day_breakout(candles: &[Candle]) -> Option<InsideDayBreakout> {
    let last = candles.len().checked_sub(1)?;
    let day = detect_inside_day(candles, last)?;
    let parent = &candles[day.parent_index];
    let compression_range = parent.range();

    Some(InsideDayBreakout {
        breakout_high: parent.get_high(),
        breakout_low: parent.get_low(),
        consecutive: count_consecutive_inside_days(candles),
        compression_range,
        compression_pct: compression_range / parent.get_low() * 100.0,
    })
}
