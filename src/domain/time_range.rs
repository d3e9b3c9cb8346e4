//! Output window for one-shot evaluations.

use crate::domain::error::SignalError;
use chrono::{DateTime, Duration, FixedOffset};

pub const MAX_SPAN_DAYS: i64 = 5;

/// Inclusive time window, at most [`MAX_SPAN_DAYS`] wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<FixedOffset>,
    end: DateTime<FixedOffset>,
}

impl TimeRange {
    pub fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Result<Self, SignalError> {
        if end <= start {
            return Err(SignalError::MalformedInput {
                reason: format!(
                    "end {} must be after start {}",
                    end.to_rfc3339(),
                    start.to_rfc3339()
                ),
            });
        }
        if end - start > Duration::days(MAX_SPAN_DAYS) {
            return Err(SignalError::MalformedInput {
                reason: format!("time range exceeds {MAX_SPAN_DAYS} days"),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, SignalError> {
        let parse = |s: &str| {
            DateTime::parse_from_rfc3339(s.trim()).map_err(|e| SignalError::MalformedInput {
                reason: format!("invalid timestamp '{s}': {e}"),
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> DateTime<FixedOffset> {
        self.end
    }

    pub fn contains(&self, ts: DateTime<FixedOffset>) -> bool {
        ts >= self.start && ts <= self.end
    }
}
