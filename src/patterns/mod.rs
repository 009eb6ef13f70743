//! Pattern detectors built on the indicator library.
//!
//! Each detector is a pure function over a candle slice returning a small
//! verdict struct.

pub mod breakout_levels;
pub mod consolidation;
pub mod inside_day;
pub mod resistance;
pub mod volume;
pub mod wedge;

pub use breakout_levels::{
    BreakoutLevel, BreakoutLevels, LevelKind, detect_breakout_levels, find_round_numbers,
    level_strength,
};
pub use consolidation::{TightBase, detect_tight_base};
pub use inside_day::{InsideDay, InsideDayBreakout, inside_day_breakout};
pub use resistance::{
    Cluster, Trigger, TriggerParams, TriggerReason, TriggerSelection, pick_trigger,
};
pub use volume::{VolumeQuality, volume_quality};
pub use wedge::{HigherLows, detect_higher_lows};
