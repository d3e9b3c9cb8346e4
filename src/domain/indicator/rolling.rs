//! Fixed-window rolling aggregates over possibly-undefined series.
//!
//! A window yields a value only once `window` observations are available and
//! every observation in it is defined; otherwise the output is `None`.

use crate::domain::indicator::Series;

fn rolling_apply<F>(values: &[Option<f64>], window: usize, f: F) -> Series
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let mut out = Vec::with_capacity(values.len());
    let mut buf: Vec<f64> = Vec::with_capacity(window);

    for i in 0..values.len() {
        if window == 0 || i + 1 < window {
            out.push(None);
            continue;
        }
        buf.clear();
        for v in &values[i + 1 - window..=i] {
            match v {
                Some(x) => buf.push(*x),
                None => break,
            }
        }
        if buf.len() == window {
            out.push(f(&buf));
        } else {
            out.push(None);
        }
    }

    out
}

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Series {
    rolling_apply(values, window, |w| {
        Some(w.iter().sum::<f64>() / w.len() as f64)
    })
}

pub fn rolling_min(values: &[Option<f64>], window: usize) -> Series {
    rolling_apply(values, window, |w| w.iter().copied().reduce(f64::min))
}

pub fn rolling_max(values: &[Option<f64>], window: usize) -> Series {
    rolling_apply(values, window, |w| w.iter().copied().reduce(f64::max))
}

/// Sample standard deviation (n - 1 divisor). Undefined for a window of 1.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Series {
    rolling_apply(values, window, |w| {
        if w.len() < 2 {
            return None;
        }
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        let variance = w
            .iter()
            .map(|x| {
                let diff = x - mean;
                diff * diff
            })
            .sum::<f64>()
            / (w.len() - 1) as f64;
        Some(variance.sqrt())
    })
}

/// Simple moving average of a fully defined series.
pub fn sma(values: &[f64], window: usize) -> Series {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    rolling_mean(&wrapped, window)
}
