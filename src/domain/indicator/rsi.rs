//! RSI (Relative Strength Index).
//!
//! Average gain/loss are simple rolling means over `period` close deltas (not
//! Wilder smoothing). The first bar has no previous close and contributes a
//! zero delta, so the first defined value is at index `period - 1`.
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss); avg_loss == 0 gives 100.

use crate::domain::indicator::Series;
use crate::domain::indicator::rolling::rolling_mean;

pub const RSI_PERIOD: usize = 14;

pub fn calculate_rsi(closes: &[f64], period: usize) -> Series {
    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());

    for i in 0..closes.len() {
        let delta = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
        gains.push(Some(if delta > 0.0 { delta } else { 0.0 }));
        losses.push(Some(if delta < 0.0 { -delta } else { 0.0 }));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(_), Some(loss)) if *loss == 0.0 => Some(100.0),
            (Some(gain), Some(loss)) => Some(100.0 - 100.0 / (1.0 + gain / loss)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_empty() {
        assert!(calculate_rsi(&[], RSI_PERIOD).is_empty());
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 5) as f64).collect();
        let rsi = calculate_rsi(&closes, RSI_PERIOD);
        for (i, v) in rsi.iter().enumerate().take(13) {
            assert!(v.is_none(), "index {i} should be undefined");
        }
        assert!(rsi[13].is_some());
    }

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let rsi = calculate_rsi(&closes, RSI_PERIOD);
        assert_eq!(rsi[14], Some(100.0));
    }

    #[test]
    fn rsi_flat_prices_guarded_to_100() {
        let rsi = calculate_rsi(&[50.0; 16], RSI_PERIOD);
        assert_eq!(rsi[15], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let rsi = calculate_rsi(&closes, RSI_PERIOD);
        assert_relative_eq!(rsi[14].unwrap(), 0.0);
    }

    #[test]
    fn rsi_known_calculation() {
        // 3 bars, period 2: deltas [0, +2, -1]
        let rsi = calculate_rsi(&[10.0, 12.0, 11.0], 2);
        assert_eq!(rsi[0], None);
        // index 1: gain mean 1, loss mean 0 → 100
        assert_eq!(rsi[1], Some(100.0));
        // index 2: gain mean 1, loss mean 0.5 → 100 - 100/3
        assert_relative_eq!(rsi[2].unwrap(), 100.0 - 100.0 / 3.0);
    }

    #[test]
    fn rsi_in_range() {
        let closes: Vec<f64> = (1..=40)
            .map(|i| 100.0 + ((i % 7) as f64 - 3.0) * 2.0)
            .collect();
        for v in calculate_rsi(&closes, RSI_PERIOD).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }
}
