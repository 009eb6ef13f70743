//! Key support/resistance levels with strength ratings and round-number bonus

use crate::indicators::candle::Candle;
use crate::indicators::pivots::{
    DEFAULT_PIVOT_LEFT, DEFAULT_PIVOT_RIGHT, Pivot, pivot_highs, pivot_lows,
};
use crate::patterns::resistance::Cluster;

pub const DEFAULT_ROUND_RANGE_PCT: f64 = 15.0;
pub const DEFAULT_LEVEL_TOLERANCE_PCT: f64 = 0.5;
const MAX_LEVELS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    Resistance,
    Support,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreakoutLevel {
    pub price: f64,
    pub kind: LevelKind,
    /// 1..=10, higher is stronger
    pub strength: u8,
    pub touches: usize,
    pub last_test_index: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BreakoutLevels {
    pub resistance: Vec<BreakoutLevel>,
    pub support: Vec<BreakoutLevel>,
    /// Strongest resistance above the current price
    pub strongest_resistance: Option<BreakoutLevel>,
    /// Strongest support below the current price
    pub strongest_support: Option<BreakoutLevel>,
}

/// Psychological round-number levels within `range_pct` of `price`.
///
/// Increments scale with the price tier: $1/$5 under $10, $5/$10 under $50,
/// $10/$25 under $100 and $25/$50/$100 above. Sorted ascending, no duplicates.
pub fn find_round_numbers(price: f64, range_pct: f64) -> Vec<f64> {
    let increments: &[f64] = if price < 10.0 {
        &[1.0, 5.0]
    } else if price < 50.0 {
        &[5.0, 10.0]
    } else if price < 100.0 {
        &[10.0, 25.0]
    } else {
        &[25.0, 50.0, 100.0]
    };

    let lower = price * (1.0 - range_pct / 100.0);
    let upper = price * (1.0 + range_pct / 100.0);

    let mut levels: Vec<f64> = increments
        .iter()
        .flat_map(|&inc| {
            let first = (lower / inc).ceil() as i64;
            let last = (upper / inc).floor() as i64;
            (first..=last).map(move |k| k as f64 * inc)
        })
        .filter(|level| (lower..=upper).contains(level))
        .collect();

    levels.sort_by(f64::total_cmp);
    levels.dedup();
    levels
}

fn is_round(price: f64, round_numbers: &[f64], tolerance_pct: f64) -> bool {
    round_numbers
        .iter()
        .any(|rn| (price - rn).abs() / price * 100.0 < tolerance_pct)
}

/// Rates a level on 1..=10 from touches, recency and round-number proximity.
pub fn level_strength(touches: usize, bars_ago: usize, is_round: bool) -> u8 {
    let touch_points = match touches {
        t if t >= 5 => 4,
        3 | 4 => 3,
        2 => 2,
        _ => 1,
    };
    let recency_points = match bars_ago {
        0..=10 => 3,
        11..=30 => 2,
        _ => 1,
    };
    let round_points = if is_round { 2 } else { 0 };

    (touch_points + recency_points + round_points).min(10)
}

impl Cluster {
    /// Strength of a resistance cluster, with the round-number bonus applied
    /// when its price sits within `tolerance_pct` of a round level.
    pub fn strength(&self, bars_ago: usize, round_numbers: &[f64], tolerance_pct: f64) -> u8 {
        level_strength(
            self.touches,
            bars_ago,
            is_round(self.price, round_numbers, tolerance_pct),
        )
    }
}

/// Finds resistance and support levels over the last `lookback` candles.
///
/// Each pivot becomes a level; touches count bars in the window whose high
/// (resistance) or low (support) lies within `tolerance_pct` of it.
pub fn detect_breakout_levels(
    candles: &[Candle],
    lookback: usize,
    tolerance_pct: f64,
) -> BreakoutLevels {
    let Some(current) = candles.last().map(|c| c.get_close()) else {
        return BreakoutLevels::default();
    };

    let window = &candles[candles.len().saturating_sub(lookback)..];
    let round_numbers = find_round_numbers(current, DEFAULT_ROUND_RANGE_PCT);

    let rate = |pivots: Vec<Pivot>, kind: LevelKind| -> Vec<BreakoutLevel> {
        let mut levels: Vec<BreakoutLevel> = pivots
            .into_iter()
            .map(|pivot| {
                let touches = window
                    .iter()
                    .map(|c| match kind {
                        LevelKind::Resistance => c.get_high(),
                        LevelKind::Support => c.get_low(),
                    })
                    .filter(|p| (p - pivot.price).abs() / pivot.price * 100.0 < tolerance_pct)
                    .count();
                let bars_ago = window.len() - pivot.index - 1;
                let round = is_round(pivot.price, &round_numbers, tolerance_pct);

                BreakoutLevel {
                    price: pivot.price,
                    kind,
                    strength: level_strength(touches, bars_ago, round),
                    touches,
                    last_test_index: pivot.index,
                }
            })
            .collect();
        levels.sort_by(|a, b| b.strength.cmp(&a.strength));
        levels
    };

    let resistance = rate(
        pivot_highs(window, DEFAULT_PIVOT_LEFT, DEFAULT_PIVOT_RIGHT),
        LevelKind::Resistance,
    );
    let support = rate(
        pivot_lows(window, DEFAULT_PIVOT_LEFT, DEFAULT_PIVOT_RIGHT),
        LevelKind::Support,
    );

    let strongest_resistance = resistance.iter().find(|l| l.price > current).copied();
    let strongest_support = support.iter().find(|l| l.price < current).copied();

    BreakoutLevels {
        resistance: resistance.into_iter().take(MAX_LEVELS).collect(),
        support: support.into_iter().take(MAX_LEVELS).collect(),
        strongest_resistance,
        strongest_support,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_numbers_low_price() {
        // $8 +/- 15%: [6.8, 9.2] -> $1 steps only
        assert_eq!(find_round_numbers(8.0, 15.0), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_round_numbers_high_price() {
        // $200 +/- 15%: [170, 230] on 25/50/100 steps
        assert_eq!(
            find_round_numbers(200.0, 15.0),
            vec![175.0, 200.0, 225.0]
        );
    }

    #[test]
    fn test_round_numbers_mid_tier_dedup() {
        // $40 +/- 15%: [34, 46] on 5/10 steps, 40 appears once
        assert_eq!(find_round_numbers(40.0, 15.0), vec![35.0, 40.0, 45.0]);
    }

    #[test]
    fn test_level_strength() {
        assert_eq!(level_strength(1, 100, false), 2);
        assert_eq!(level_strength(2, 20, false), 4);
        assert_eq!(level_strength(3, 5, true), 8);
        assert_eq!(level_strength(6, 0, true), 9);
    }

    #[test]
    fn test_cluster_round_bonus() {
        let cluster = Cluster {
            price: 100.1,
            touches: 3,
            members: vec![100.0, 100.1, 100.2],
        };
        let rounds = find_round_numbers(99.0, 15.0);
        assert_eq!(cluster.strength(5, &rounds, 0.5), 8);
        assert_eq!(cluster.strength(5, &[], 0.5), 6);
    }

    #[test]
    fn test_detect_levels_around_price() {
        // Peaks at 110 (two of them) above a 100 close, one trough at 90
        let mut candles: Vec<Candle> = (0..40)
            .map(|i| Candle::new(i, 100.0, 101.0, 99.0, 100.0, 1.0))
            .collect();
        candles[10] = Candle::new(10, 100.0, 110.0, 99.0, 100.0, 1.0);
        candles[33] = Candle::new(33, 100.0, 110.0, 99.0, 100.0, 1.0);
        candles[18] = Candle::new(18, 100.0, 101.0, 90.0, 100.0, 1.0);

        let levels = detect_breakout_levels(&candles, 120, 0.5);
        assert_eq!(levels.resistance.len(), 2);
        assert!(levels.resistance.iter().all(|l| l.touches == 2));

        let top = levels.strongest_resistance.unwrap();
        assert_eq!(top.price, 110.0);
        assert_eq!(top.last_test_index, 33);

        let support = levels.strongest_support.unwrap();
        assert_eq!(support.price, 90.0);
        assert_eq!(support.touches, 1);
    }

    #[test]
    fn test_detect_levels_empty() {
        assert_eq!(detect_breakout_levels(&[], 120, 0.5), BreakoutLevels::default());
    }
}
