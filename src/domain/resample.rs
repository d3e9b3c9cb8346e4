//! Aggregation of fine bars into a coarser timeframe.
//!
//! Buckets start at multiples of the target interval counted from local
//! midnight in each bar's own offset. Open is the first bar's open, close the
//! last bar's close, high and low the extremes, volume the sum. Buckets with
//! no bars are not emitted.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::Bar;
use chrono::{DateTime, Duration, FixedOffset, Timelike};

fn bucket_start(ts: DateTime<FixedOffset>, target_minutes: u32) -> DateTime<FixedOffset> {
    let width = i64::from(target_minutes) * 60;
    let secs = i64::from(ts.num_seconds_from_midnight());
    ts - Duration::seconds(secs % width) - Duration::nanoseconds(i64::from(ts.nanosecond()))
}

pub fn resample(bars: &[Bar], source: u32, target: u32) -> Result<Vec<Bar>, SignalError> {
    if source == 0 || target == 0 || target < source || target % source != 0 {
        return Err(SignalError::MisconfiguredRule {
            reason: format!("cannot resample {source}m bars into {target}m bars"),
        });
    }
    if target == source {
        return Ok(bars.to_vec());
    }

    let mut out: Vec<Bar> = Vec::new();
    for bar in bars {
        let start = bucket_start(bar.timestamp, target);
        match out.last_mut() {
            Some(current) if current.timestamp == start => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
                current.volume += bar.volume;
            }
            _ => out.push(Bar {
                timestamp: start,
                ..bar.clone()
            }),
        }
    }
    Ok(out)
}
