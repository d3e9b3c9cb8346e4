//! mtfscan — multi-timeframe indicator signals and background scanning.
//!
//! Pure evaluation lives in [`domain`], I/O traits in [`ports`], their
//! concrete implementations in [`adapters`], and the long-running scanner
//! jobs in [`scanner`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
pub mod scanner;
