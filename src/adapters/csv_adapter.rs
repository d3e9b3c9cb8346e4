//! CSV directory data adapter.
//!
//! Bars for one symbol and timeframe live in `{SYMBOL}_{MINUTES}m.csv` with
//! a `timestamp,open,high,low,close,volume` header and RFC 3339 timestamps.
//! When a timeframe has no file but a 1-minute file exists, the 1-minute
//! bars are resampled.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::{Bar, BarRecord, validate_bars};
use crate::domain::resample::resample;
use crate::ports::data_port::DataPort;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

const SOURCE_TIMEFRAME: u32 = 1;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: u32) -> PathBuf {
        self.base_path.join(format!("{symbol}_{timeframe}m.csv"))
    }

    async fn read_bars(&self, path: &Path) -> Result<Vec<Bar>, SignalError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| SignalError::DataSource {
                reason: format!("failed to read {}: {e}", path.display()),
            })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for result in rdr.deserialize::<BarRecord>() {
            let record = result.map_err(|e| SignalError::MalformedInput {
                reason: format!("{}: {e}", path.display()),
            })?;
            bars.push(Bar::try_from(record)?);
        }

        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        validate_bars(&bars)?;
        Ok(bars)
    }
}

/// Symbol and minutes from a `{SYMBOL}_{MINUTES}m.csv` file name.
fn parse_file_name(name: &str) -> Option<(&str, u32)> {
    let stem = name.strip_suffix("m.csv")?;
    let (symbol, minutes) = stem.rsplit_once('_')?;
    if symbol.is_empty() {
        return None;
    }
    Some((symbol, minutes.parse().ok()?))
}

#[async_trait]
impl DataPort for CsvAdapter {
    async fn fetch_bars(&self, symbol: &str, timeframe: u32) -> Result<Vec<Bar>, SignalError> {
        let path = self.csv_path(symbol, timeframe);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            debug!(symbol, timeframe, path = %path.display(), "reading bars");
            return self.read_bars(&path).await;
        }

        let source = self.csv_path(symbol, SOURCE_TIMEFRAME);
        if timeframe != SOURCE_TIMEFRAME && tokio::fs::try_exists(&source).await.unwrap_or(false) {
            debug!(symbol, timeframe, "resampling from 1m bars");
            let bars = self.read_bars(&source).await?;
            return resample(&bars, SOURCE_TIMEFRAME, timeframe);
        }

        Err(SignalError::DataSource {
            reason: format!("no {timeframe}m data for {symbol} in {}", self.base_path.display()),
        })
    }

    async fn list_symbols(&self) -> Result<Vec<String>, SignalError> {
        let mut entries =
            tokio::fs::read_dir(&self.base_path)
                .await
                .map_err(|e| SignalError::DataSource {
                    reason: format!(
                        "failed to read directory {}: {e}",
                        self.base_path.display()
                    ),
                })?;

        let mut symbols = BTreeSet::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SignalError::DataSource {
                reason: format!("directory entry error: {e}"),
            })?
        {
            let name = entry.file_name();
            if let Some((symbol, _)) = parse_file_name(&name.to_string_lossy()) {
                symbols.insert(symbol.to_string());
            }
        }

        Ok(symbols.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let five = "timestamp,open,high,low,close,volume\n\
            2024-01-15T09:20:00+05:30,105.0,115.0,100.0,110.0,60000\n\
            2024-01-15T09:15:00+05:30,100.0,110.0,90.0,105.0,50000\n\
            2024-01-15T09:25:00+05:30,110.0,120.0,105.0,115.0,55000\n";
        fs::write(path.join("TCS.NS_5m.csv"), five).unwrap();

        let one = "timestamp,open,high,low,close,volume\n\
            2024-01-15T09:15:00+05:30,10.0,11.0,9.0,10.5,100\n\
            2024-01-15T09:16:00+05:30,10.5,12.0,10.0,11.0,100\n\
            2024-01-15T09:17:00+05:30,11.0,11.5,8.0,9.0,100\n\
            2024-01-15T09:18:00+05:30,9.0,9.5,8.5,9.2,100\n";
        fs::write(path.join("NIFTY_1m.csv"), one).unwrap();
        fs::write(path.join("notes.txt"), "ignored").unwrap();

        (dir, path)
    }

    #[tokio::test]
    async fn fetch_bars_sorted_by_timestamp() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("TCS.NS", 5).await.unwrap();
        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].high, 110.0);
        assert_eq!(bars[0].low, 90.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000.0);
        assert!(bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[tokio::test]
    async fn missing_timeframe_resamples_from_one_minute() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter.fetch_bars("NIFTY", 3).await.unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].high, 12.0);
        assert_eq!(bars[0].close, 9.0);
        assert_eq!(bars[0].volume, 300.0);
    }

    #[tokio::test]
    async fn missing_file_is_data_source_error() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_bars("XYZ", 3).await;
        assert!(matches!(result, Err(SignalError::DataSource { .. })));
    }

    #[tokio::test]
    async fn malformed_row_is_rejected() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("BAD_3m.csv"),
            "timestamp,open,high,low,close,volume\n2024-01-15T09:15:00+05:30,abc,1,1,1,1\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let result = adapter.fetch_bars("BAD", 3).await;
        assert!(matches!(result, Err(SignalError::MalformedInput { .. })));
    }

    #[tokio::test]
    async fn list_symbols_from_file_names() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let symbols = adapter.list_symbols().await.unwrap();
        assert_eq!(symbols, vec!["NIFTY", "TCS.NS"]);
    }

    #[test]
    fn file_name_parsing() {
        assert_eq!(parse_file_name("RELIANCE.NS_15m.csv"), Some(("RELIANCE.NS", 15)));
        assert_eq!(parse_file_name("A_B_3m.csv"), Some(("A_B", 3)));
        assert_eq!(parse_file_name("_3m.csv"), None);
        assert_eq!(parse_file_name("X_fivem.csv"), None);
        assert_eq!(parse_file_name("X_5.csv"), None);
    }
}
