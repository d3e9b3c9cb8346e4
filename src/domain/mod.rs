//! Core domain types and logic.

pub mod align;
pub mod error;
pub mod indicator;
pub mod ohlcv;
pub mod pipeline;
pub mod presets;
pub mod resample;
pub mod rule;
pub mod rule_eval;
pub mod rule_parser;
pub mod signal;
pub mod strategy;
pub mod table;
pub mod time_range;
pub mod universe;
