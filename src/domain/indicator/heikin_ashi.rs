//! Heikin-Ashi candles.

use crate::domain::ohlcv::Bar;

#[derive(Debug, Clone, PartialEq)]
pub struct HeikinAshiSeries {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

/// HA_close = (O+H+L+C)/4; HA_open[0] = (open[0]+close[0])/2, then the
/// midpoint of the previous HA candle body; HA_high/HA_low extend the raw
/// range to cover the HA body.
pub fn calculate_heikin_ashi(bars: &[Bar]) -> HeikinAshiSeries {
    let close: Vec<f64> = bars.iter().map(Bar::average_price).collect();

    let mut open = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            open.push((bar.open + bar.close) / 2.0);
        } else {
            open.push((open[i - 1] + close[i - 1]) / 2.0);
        }
    }

    let high = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| bar.high.max(open[i]).max(close[i]))
        .collect();
    let low = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| bar.low.min(open[i]).min(close[i]))
        .collect();

    HeikinAshiSeries {
        open,
        high,
        low,
        close,
    }
}
