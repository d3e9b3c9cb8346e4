//! Market data access port.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::Bar;
use async_trait::async_trait;

#[async_trait]
pub trait DataPort: Send + Sync {
    /// Ascending, de-duplicated bars of `timeframe` minutes for `symbol`.
    async fn fetch_bars(&self, symbol: &str, timeframe: u32) -> Result<Vec<Bar>, SignalError>;

    /// The symbol universe a scan should cover.
    async fn list_symbols(&self) -> Result<Vec<String>, SignalError>;
}
