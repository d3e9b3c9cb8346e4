//! Bollinger Bands.
//!
//! - Middle: SMA over `period` closes
//! - Upper/Lower: middle ± multiplier × sample standard deviation (n - 1)
//! - Width: upper - lower
//!
//! Default parameters: period=20, multiplier=2.0. Warmup: first (period-1)
//! bars are undefined.

use crate::domain::indicator::Series;
use crate::domain::indicator::rolling::{rolling_mean, rolling_std};

pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_MULT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerSeries {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
    pub width: Series,
}

pub fn calculate_bollinger(closes: &[f64], period: usize, mult: f64) -> BollingerSeries {
    let values: Vec<Option<f64>> = closes.iter().copied().map(Some).collect();
    let middle = rolling_mean(&values, period);
    let std = rolling_std(&values, period);

    let mut upper = Vec::with_capacity(closes.len());
    let mut lower = Vec::with_capacity(closes.len());
    let mut width = Vec::with_capacity(closes.len());

    for (m, s) in middle.iter().zip(&std) {
        match (m, s) {
            (Some(m), Some(s)) => {
                let u = m + s * mult;
                let l = m - s * mult;
                upper.push(Some(u));
                lower.push(Some(l));
                width.push(Some(u - l));
            }
            _ => {
                upper.push(None);
                lower.push(None);
                width.push(None);
            }
        }
    }

    BollingerSeries {
        upper,
        middle,
        lower,
        width,
    }
}
