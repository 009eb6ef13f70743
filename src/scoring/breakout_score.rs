//! 0-100 breakout quality score and the actionability gate
//!
//! Point allocation:
//! - base/contraction: up to 40 (tight base 20, or partial credit from the
//!   range; ATR contraction 20)
//! - structure: 15 for ascending lows
//! - resistance quality: 20 for a flat top (at least `min_flat_top_touches`
//!   touches), 12 for two touches, 6 otherwise
//! - volume: 15 when up-day volume dominates
//! - proximity: up to 10, linear from 0% to 3% distance

/// Distance to trigger (percent) within which a setup is actionable.
pub const MAX_ACTIONABLE_DISTANCE_PCT: f64 = 3.0;
/// Distance (percent) under which the "near trigger" note is added.
const NEAR_TRIGGER_PCT: f64 = 1.5;

/// Touches a cluster needs to count as a flat top unless configured otherwise.
pub const DEFAULT_MIN_FLAT_TOP_TOUCHES: usize = 3;

/// Detector outputs the score is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub tight_base: bool,
    pub range_pct: f64,
    pub atr_down: bool,
    pub higher_lows: bool,
    pub flat_top_touches: usize,
    /// Same threshold trigger selection used; never below 1
    pub min_flat_top_touches: usize,
    pub volume_ok: bool,
    /// Absolute percent gap between price and trigger
    pub distance_pct: f64,
}

impl Default for ScoreInputs {
    fn default() -> Self {
        Self {
            tight_base: false,
            range_pct: 0.0,
            atr_down: false,
            higher_lows: false,
            flat_top_touches: 0,
            min_flat_top_touches: DEFAULT_MIN_FLAT_TOP_TOUCHES,
            volume_ok: false,
            distance_pct: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakoutScore {
    pub score: u8,
    pub notes: Vec<String>,
}

fn clamp(n: f64, min: f64, max: f64) -> f64 {
    n.max(min).min(max)
}

/// Scores a setup. Pure: identical inputs always give identical output.
pub fn score_breakout(inputs: &ScoreInputs) -> BreakoutScore {
    let mut score = 0.0;
    let mut notes: Vec<String> = Vec::new();

    if inputs.tight_base {
        score += 20.0;
        notes.push("tight base".into());
    } else {
        score += clamp(20.0 - inputs.range_pct, 0.0, 15.0);
    }

    if inputs.atr_down {
        score += 20.0;
        notes.push("vol contraction".into());
    }

    if inputs.higher_lows {
        score += 15.0;
        notes.push("higher lows".into());
    }

    let flat_top = inputs.min_flat_top_touches.max(1);
    score += match inputs.flat_top_touches {
        t if t >= flat_top => {
            notes.push("flat top resistance".into());
            20.0
        }
        t if t >= 2 => 12.0,
        _ => 6.0,
    };

    if inputs.volume_ok {
        score += 15.0;
        notes.push("volume confirms".into());
    }

    let distance = inputs.distance_pct;
    score += clamp(10.0 - (distance / MAX_ACTIONABLE_DISTANCE_PCT) * 10.0, 0.0, 10.0);
    if distance <= NEAR_TRIGGER_PCT {
        notes.push("near trigger".into());
    }

    BreakoutScore {
        score: clamp(score, 0.0, 100.0) as u8,
        notes,
    }
}

/// True when the setup is close enough to its trigger to act on.
pub fn is_actionable(distance_pct: f64) -> bool {
    distance_pct <= MAX_ACTIONABLE_DISTANCE_PCT
}
