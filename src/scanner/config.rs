//! Scanner settings from the `[scanner]` configuration section.

use crate::domain::error::SignalError;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use std::time::Duration;

pub const SECTION: &str = "scanner";

pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 180;
pub const DEFAULT_BATCH_SIZE: usize = 20;
pub const DEFAULT_BATCH_PAUSE_MS: u64 = 1000;
pub const DEFAULT_FALLBACK_SYMBOLS: [&str; 6] = [
    "RELIANCE.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "INFY.NS",
    "NIFTY",
    "BANKNIFTY",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ScannerConfig {
    /// Wait between the end of one cycle and the start of the next.
    pub cycle_interval: Duration,
    /// Symbols evaluated concurrently.
    pub batch_size: usize,
    pub batch_pause: Duration,
    /// Universe used when the data source cannot list symbols.
    pub fallback_symbols: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            cycle_interval: Duration::from_secs(DEFAULT_CYCLE_INTERVAL_SECS),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: Duration::from_millis(DEFAULT_BATCH_PAUSE_MS),
            fallback_symbols: DEFAULT_FALLBACK_SYMBOLS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> SignalError {
    SignalError::ConfigInvalid {
        section: SECTION.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn positive(config: &dyn ConfigPort, key: &str, default: u64) -> Result<u64, SignalError> {
    let value = config.get_int_or(SECTION, key, default as i64)?;
    if value <= 0 {
        return Err(invalid(key, format!("must be positive, got {value}")));
    }
    Ok(value as u64)
}

impl ScannerConfig {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SignalError> {
        let cycle_interval_secs =
            positive(config, "cycle_interval_secs", DEFAULT_CYCLE_INTERVAL_SECS)?;
        let batch_size = positive(config, "batch_size", DEFAULT_BATCH_SIZE as u64)?;

        let batch_pause_ms = config.get_int_or(SECTION, "batch_pause_ms", DEFAULT_BATCH_PAUSE_MS as i64)?;
        if batch_pause_ms < 0 {
            return Err(invalid(
                "batch_pause_ms",
                format!("must not be negative, got {batch_pause_ms}"),
            ));
        }

        let fallback_symbols = match config.get_string(SECTION, "fallback_symbols") {
            Some(list) => {
                parse_symbols(&list).map_err(|e| invalid("fallback_symbols", e.to_string()))?
            }
            None => ScannerConfig::default().fallback_symbols,
        };

        Ok(Self {
            cycle_interval: Duration::from_secs(cycle_interval_secs),
            batch_size: batch_size as usize,
            batch_pause: Duration::from_millis(batch_pause_ms as u64),
            fallback_symbols,
        })
    }
}
