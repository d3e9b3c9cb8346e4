//! Stochastic oscillator and its cross state.
//!
//! %K = 100 × (close - lowest_low) / (highest_high - lowest_low), with a flat
//! range (highest == lowest) defined as exactly 50. %D = rolling mean of %K.
//! Cross state is +1 when %K > %D, -1 otherwise, undefined until both exist.

use crate::domain::indicator::Series;
use crate::domain::indicator::rolling::{rolling_max, rolling_mean, rolling_min};
use crate::domain::ohlcv::Bar;

pub const STOCH_K_PERIOD: usize = 14;
pub const STOCH_D_PERIOD: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct StochasticSeries {
    pub k: Series,
    pub d: Series,
    pub cross: Series,
}

pub fn calculate_stochastic(bars: &[Bar], k_period: usize, d_period: usize) -> StochasticSeries {
    let lows: Vec<Option<f64>> = bars.iter().map(|b| Some(b.low)).collect();
    let highs: Vec<Option<f64>> = bars.iter().map(|b| Some(b.high)).collect();
    let lowest = rolling_min(&lows, k_period);
    let highest = rolling_max(&highs, k_period);

    let k: Series = bars
        .iter()
        .zip(lowest.iter().zip(&highest))
        .map(|(bar, (lo, hi))| match (lo, hi) {
            (Some(lo), Some(hi)) if hi == lo => Some(50.0),
            (Some(lo), Some(hi)) => Some(100.0 * (bar.close - lo) / (hi - lo)),
            _ => None,
        })
        .collect();
    let d = rolling_mean(&k, d_period);

    let cross = k
        .iter()
        .zip(&d)
        .map(|(k, d)| match (k, d) {
            (Some(k), Some(d)) => Some(if k > d { 1.0 } else { -1.0 }),
            _ => None,
        })
        .collect();

    StochasticSeries { k, d, cross }
}
