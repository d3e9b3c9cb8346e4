//! OHLCV bar representation and input validation.

use crate::domain::error::SignalError;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// (open + high + low + close) / 4
    pub fn average_price(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Bar as delivered by a market-data collaborator, before validation.
///
/// Every field is optional so that a missing value surfaces as
/// [`SignalError::MalformedInput`] instead of a deserialisation failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BarRecord {
    #[serde(alias = "date", alias = "datetime")]
    pub timestamp: Option<String>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

fn required(value: Option<f64>, field: &str, ts: &str) -> Result<f64, SignalError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        Some(v) => Err(SignalError::MalformedInput {
            reason: format!("{field} is not a finite number ({v}) at {ts}"),
        }),
        None => Err(SignalError::MalformedInput {
            reason: format!("missing {field} at {ts}"),
        }),
    }
}

impl TryFrom<BarRecord> for Bar {
    type Error = SignalError;

    fn try_from(record: BarRecord) -> Result<Self, Self::Error> {
        let raw_ts = record.timestamp.ok_or_else(|| SignalError::MalformedInput {
            reason: "missing timestamp".into(),
        })?;
        let timestamp =
            DateTime::parse_from_rfc3339(&raw_ts).map_err(|e| SignalError::MalformedInput {
                reason: format!("invalid timestamp {raw_ts:?}: {e}"),
            })?;

        let bar = Bar {
            timestamp,
            open: required(record.open, "open", &raw_ts)?,
            high: required(record.high, "high", &raw_ts)?,
            low: required(record.low, "low", &raw_ts)?,
            close: required(record.close, "close", &raw_ts)?,
            volume: required(record.volume, "volume", &raw_ts)?,
        };
        if bar.volume < 0.0 {
            return Err(SignalError::MalformedInput {
                reason: format!("negative volume at {raw_ts}"),
            });
        }
        Ok(bar)
    }
}

/// Parse a JSON array of bar records and validate the resulting sequence.
pub fn parse_bars_json(input: &str) -> Result<Vec<Bar>, SignalError> {
    let records: Vec<BarRecord> =
        serde_json::from_str(input).map_err(|e| SignalError::MalformedInput {
            reason: format!("bar payload: {e}"),
        })?;
    let bars = records
        .into_iter()
        .map(Bar::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    validate_bars(&bars)?;
    Ok(bars)
}

/// Checks the ordering and field invariants every engine stage relies on.
pub fn validate_bars(bars: &[Bar]) -> Result<(), SignalError> {
    for (i, bar) in bars.iter().enumerate() {
        let fields = [bar.open, bar.high, bar.low, bar.close, bar.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(SignalError::MalformedInput {
                reason: format!("non-finite field at {}", bar.timestamp.to_rfc3339()),
            });
        }
        if bar.volume < 0.0 {
            return Err(SignalError::MalformedInput {
                reason: format!("negative volume at {}", bar.timestamp.to_rfc3339()),
            });
        }
        if i > 0 && bar.timestamp <= bars[i - 1].timestamp {
            return Err(SignalError::MalformedInput {
                reason: format!(
                    "timestamps not strictly ascending at index {i} ({})",
                    bar.timestamp.to_rfc3339()
                ),
            });
        }
    }
    Ok(())
}
