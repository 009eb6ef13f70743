//! Volume quality: accumulation shows up as heavier volume on up days

use crate::indicators::candle::Candle;

pub const DEFAULT_VOLUME_LOOKBACK: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VolumeQuality {
    pub ok: bool,
    pub avg_up: f64,
    pub avg_down: f64,
}

/// Compares mean volume on up days (`close >= open`) with down days over the
/// last `lookback` candles. Negative when both means are zero.
pub fn volume_quality(candles: &[Candle], lookback: usize) -> VolumeQuality {
    let window = &candles[candles.len().saturating_sub(lookback)..];

    let (up, down): (Vec<&Candle>, Vec<&Candle>) = window.iter().partition(|c| c.is_up_day());
    let avg_up = mean_volume(&up);
    let avg_down = mean_volume(&down);

    let ok = (avg_up != 0.0 || avg_down != 0.0) && avg_up > avg_down;

    VolumeQuality { ok, avg_up, avg_down }
}

fn mean_volume(candles: &[&Candle]) -> f64 {
    if candles.is_empty() {
        return 0.0;
    }
    candles.iter().map(|c| c.get_volume()).sum::<f64>() / candles.len() as f64
}
