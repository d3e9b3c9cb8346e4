//! Rate of change in percent.
//!
//! ROC(n)[i] = (C[i] - C[i-n]) / C[i-n] × 100. With n = 1 this is the
//! bar-over-bar percentage change. Undefined during warmup or when the
//! reference close is zero.

use crate::domain::indicator::Series;

pub fn calculate_roc(closes: &[f64], period: usize) -> Series {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            if period == 0 || i < period {
                return None;
            }
            let prev = closes[i - period];
            if prev == 0.0 {
                None
            } else {
                Some((close - prev) / prev * 100.0)
            }
        })
        .collect()
}
