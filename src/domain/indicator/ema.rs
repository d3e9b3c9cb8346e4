//! Exponential Moving Average.
//!
//! α = 2/(span+1), seeded with the first raw value (no SMA seed, no warmup):
//! EMA[0] = x[0], EMA[i] = α·x[i] + (1-α)·EMA[i-1].

pub const EMA_SPANS: [usize; 7] = [5, 9, 12, 20, 26, 50, 200];

pub fn smoothing_factor(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}

pub fn calculate_ema(values: &[f64], span: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let Some(&first) = values.first() else {
        return out;
    };

    let alpha = smoothing_factor(span);
    let mut ema = first;
    out.push(ema);
    for &x in &values[1..] {
        ema = alpha * x + (1.0 - alpha) * ema;
        out.push(ema);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_seed_is_first_value() {
        let out = calculate_ema(&[10.0, 20.0, 30.0], 3);
        assert!((out[0] - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_recursive_calculation() {
        let out = calculate_ema(&[10.0, 20.0, 30.0, 40.0, 50.0], 3);
        let k = 2.0 / 4.0;

        let e1 = k * 20.0 + (1.0 - k) * 10.0;
        let e2 = k * 30.0 + (1.0 - k) * e1;
        let e3 = k * 40.0 + (1.0 - k) * e2;
        assert!((out[1] - e1).abs() < f64::EPSILON);
        assert!((out[2] - e2).abs() < f64::EPSILON);
        assert!((out[3] - e3).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_span_1_tracks_input() {
        let out = calculate_ema(&[10.0, 20.0, 30.0], 1);
        assert_eq!(out, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_equal_prices() {
        let out = calculate_ema(&[100.0; 30], 26);
        assert!(out.iter().all(|v| *v == 100.0));
    }

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_smoothing_factor() {
        assert!((smoothing_factor(10) - 2.0 / 11.0).abs() < f64::EPSILON);
    }
}
