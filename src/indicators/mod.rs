//! Technical indicators for daily bar analysis

pub mod candle;
pub mod moving_averages;
pub mod pivots;
pub mod volatility;
