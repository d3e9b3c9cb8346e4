#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset};
pub use mtfscan::domain::error::SignalError;
pub use mtfscan::domain::ohlcv::Bar;
use mtfscan::ports::data_port::DataPort;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MockDataPort {
    pub data: HashMap<(String, u32), Vec<Bar>>,
    pub errors: HashMap<String, String>,
    pub panics: HashSet<String>,
    pub symbols: Option<Result<Vec<String>, String>>,
    fetches: AtomicUsize,
    fetched: Mutex<Vec<String>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            panics: HashSet::new(),
            symbols: None,
            fetches: AtomicUsize::new(0),
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_bars(mut self, symbol: &str, timeframe: u32, bars: Vec<Bar>) -> Self {
        self.data.insert((symbol.to_string(), timeframe), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_panic(mut self, symbol: &str) -> Self {
        self.panics.insert(symbol.to_string());
        self
    }

    /// Override `list_symbols`; by default it lists every symbol with bars.
    pub fn with_symbols(mut self, symbols: &[&str]) -> Self {
        self.symbols = Some(Ok(symbols.iter().map(|s| s.to_string()).collect()));
        self
    }

    pub fn with_listing_error(mut self, reason: &str) -> Self {
        self.symbols = Some(Err(reason.to_string()));
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Symbols fetched so far, in call order, one entry per timeframe.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl DataPort for MockDataPort {
    async fn fetch_bars(&self, symbol: &str, timeframe: u32) -> Result<Vec<Bar>, SignalError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(symbol.to_string());
        if self.panics.contains(symbol) {
            panic!("mock panic for {symbol}");
        }
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SignalError::DataSource {
                reason: reason.clone(),
            });
        }
        self.data
            .get(&(symbol.to_string(), timeframe))
            .cloned()
            .ok_or_else(|| SignalError::DataSource {
                reason: format!("no {timeframe}m bars for {symbol}"),
            })
    }

    async fn list_symbols(&self) -> Result<Vec<String>, SignalError> {
        match &self.symbols {
            Some(Ok(symbols)) => Ok(symbols.clone()),
            Some(Err(reason)) => Err(SignalError::DataSource {
                reason: reason.clone(),
            }),
            None => {
                let mut symbols: Vec<String> =
                    self.data.keys().map(|(s, _)| s.clone()).collect();
                symbols.sort();
                symbols.dedup();
                Ok(symbols)
            }
        }
    }
}

pub fn session_start() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2024-01-15T09:15:00+05:30").unwrap()
}

/// Bars `minutes` apart with the given closes. Each bar opens at the prior
/// close and its range extends half a point past the body.
pub fn bars_from_closes(closes: &[f64], minutes: i64) -> Vec<Bar> {
    let start = session_start();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: start + Duration::minutes(minutes * i as i64),
                open,
                high: open.max(close) + 0.5,
                low: open.min(close) - 0.5,
                close,
                volume: 1000.0 + 10.0 * i as f64,
            }
        })
        .collect()
}

/// Flat at 10 for seven bars, then 12, 13, 14.
pub fn flat_then_rising(minutes: i64) -> Vec<Bar> {
    bars_from_closes(
        &[10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0, 12.0, 13.0, 14.0],
        minutes,
    )
}

/// Flat at 20 for seven bars, then 18, 17, 16.
pub fn flat_then_falling(minutes: i64) -> Vec<Bar> {
    bars_from_closes(
        &[20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 20.0, 18.0, 17.0, 16.0],
        minutes,
    )
}

/// Close rising one point per bar from `start_price`.
pub fn trending_bars(count: usize, start_price: f64, minutes: i64) -> Vec<Bar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + i as f64).collect();
    bars_from_closes(&closes, minutes)
}
