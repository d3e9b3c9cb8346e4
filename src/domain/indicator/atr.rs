//! Average True Range as a simple rolling mean of true range.
//!
//! The first bar has no previous close; its true range is high - low.

use crate::domain::indicator::Series;
use crate::domain::indicator::rolling::rolling_mean;
use crate::domain::ohlcv::Bar;

pub const ATR_PERIOD: usize = 14;

pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

pub fn calculate_atr(bars: &[Bar], period: usize) -> Series {
    let tr: Vec<Option<f64>> = true_range(bars).into_iter().map(Some).collect();
    rolling_mean(&tr, period)
}
