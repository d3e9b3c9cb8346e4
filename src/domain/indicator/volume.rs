//! Volume moving average and relative volume.

use crate::domain::indicator::Series;
use crate::domain::indicator::rolling::rolling_mean;

pub const VOLUME_PERIOD: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeSeries {
    pub sma: Series,
    pub ratio: Series,
}

pub fn calculate_volume(volumes: &[f64], period: usize) -> VolumeSeries {
    let values: Vec<Option<f64>> = volumes.iter().copied().map(Some).collect();
    let sma = rolling_mean(&values, period);
    let ratio = volumes
        .iter()
        .zip(&sma)
        .map(|(v, avg)| match avg {
            Some(avg) if *avg != 0.0 => Some(v / avg),
            _ => None,
        })
        .collect();
    VolumeSeries { sma, ratio }
}
