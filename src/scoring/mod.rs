//! Composite breakout scoring

pub mod breakout_score;

pub use breakout_score::{BreakoutScore, ScoreInputs, is_actionable, score_breakout};
