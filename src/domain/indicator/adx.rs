//! Directional movement (+DI, -DI) and ADX.
//!
//! Uses simple rolling means throughout rather than Wilder smoothing:
//! - +DM = high[i] - high[i-1], -DM = low[i-1] - low[i], negatives zeroed,
//!   undefined on the first bar
//! - ±DI = 100 × mean(±DM) / ATR
//! - DX = 100 × |+DI - -DI| / (+DI + -DI)
//! - ADX = mean(DX)
//!
//! A zero ATR or a zero DI sum leaves the value undefined.

use crate::domain::indicator::Series;
use crate::domain::indicator::rolling::rolling_mean;
use crate::domain::ohlcv::Bar;

pub const ADX_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub struct AdxSeries {
    pub plus_di: Series,
    pub minus_di: Series,
    pub adx: Series,
}

fn directional_index(dm_mean: &Series, atr: &Series) -> Series {
    dm_mean
        .iter()
        .zip(atr)
        .map(|(dm, atr)| match (dm, atr) {
            (Some(dm), Some(atr)) if *atr != 0.0 => Some(100.0 * dm / atr),
            _ => None,
        })
        .collect()
}

pub fn calculate_adx(bars: &[Bar], atr: &Series, period: usize) -> AdxSeries {
    let mut plus_dm = Vec::with_capacity(bars.len());
    let mut minus_dm = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        if i == 0 {
            plus_dm.push(None);
            minus_dm.push(None);
            continue;
        }
        let up = bars[i].high - bars[i - 1].high;
        let down = bars[i - 1].low - bars[i].low;
        plus_dm.push(Some(up.max(0.0)));
        minus_dm.push(Some(down.max(0.0)));
    }

    let plus_di = directional_index(&rolling_mean(&plus_dm, period), atr);
    let minus_di = directional_index(&rolling_mean(&minus_dm, period), atr);

    let dx: Series = plus_di
        .iter()
        .zip(&minus_di)
        .map(|(p, m)| match (p, m) {
            (Some(p), Some(m)) if p + m != 0.0 => Some(100.0 * (p - m).abs() / (p + m)),
            _ => None,
        })
        .collect();
    let adx = rolling_mean(&dx, period);

    AdxSeries {
        plus_di,
        minus_di,
        adx,
    }
}
