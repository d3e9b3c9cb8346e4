//! Built-in per-timeframe strategies for the three-timeframe confluence scan.
//!
//! Each preset is evaluated on its own timeframe's table and stored as a
//! `SIGNAL` column (+1 buy, -1 sell, 0 hold), so after alignment the base
//! grid carries `SIGNAL`, `SIGNAL_5` and `SIGNAL_15`.

use crate::domain::align::AlignedTable;
use crate::domain::error::SignalError;
use crate::domain::rule::{Comparand, Condition, Operator, RuleSet};
use crate::domain::rule_eval::timeframe_verdicts;
use crate::domain::signal::{Signal, confluence};
use crate::domain::table::IndicatorTable;

pub const SIGNAL_COLUMN: &str = "SIGNAL";

pub const PRESET_TIMEFRAMES: [u32; 3] = [3, 5, 15];

fn col(name: &str) -> Comparand {
    Comparand::Column(name.to_string())
}

fn lit(value: f64) -> Comparand {
    Comparand::Literal(value)
}

fn three_minute() -> RuleSet {
    RuleSet {
        buy: vec![
            Condition::new("EMA_5", Operator::CrossesAbove, col("EMA_9")),
            Condition::new("MACD", Operator::Greater, col("SIGNAL_LINE")),
            Condition::new("MACD_HIST", Operator::Greater, lit(0.0)),
            Condition::new("HA_CLOSE", Operator::Greater, col("HA_OPEN")),
        ],
        sell: vec![
            Condition::new("EMA_5", Operator::CrossesBelow, col("EMA_9")),
            Condition::new("MACD", Operator::Less, col("SIGNAL_LINE")),
            Condition::new("MACD_HIST", Operator::Less, lit(0.0)),
            Condition::new("HA_CLOSE", Operator::Less, col("HA_OPEN")),
        ],
    }
}

fn five_minute() -> RuleSet {
    RuleSet {
        buy: vec![
            Condition::new("SMA_9", Operator::CrossesAbove, col("SMA_50")),
            Condition::new("RSI", Operator::Greater, lit(60.0)),
        ],
        sell: vec![
            Condition::new("SMA_9", Operator::CrossesBelow, col("SMA_50")),
            Condition::new("RSI", Operator::Less, lit(40.0)),
        ],
    }
}

fn fifteen_minute() -> RuleSet {
    RuleSet {
        buy: vec![
            Condition::new("CLOSE", Operator::Greater, col("EMA_200")),
            Condition::new("EMA_5", Operator::CrossesAbove, col("EMA_50")),
            Condition::new("STOCH_CROSS", Operator::Equal, lit(1.0)),
        ],
        sell: vec![
            Condition::new("CLOSE", Operator::Less, col("EMA_200")),
            Condition::new("EMA_5", Operator::CrossesBelow, col("EMA_50")),
            Condition::new("STOCH_CROSS", Operator::Equal, lit(-1.0)),
        ],
    }
}

/// The built-in rule set for `timeframe`, if there is one.
pub fn preset_rules(timeframe: u32) -> Option<RuleSet> {
    match timeframe {
        3 => Some(three_minute()),
        5 => Some(five_minute()),
        15 => Some(fifteen_minute()),
        _ => None,
    }
}

/// Buy when every preset timeframe's `SIGNAL` is +1, sell when every one is -1.
pub fn preset_confluence_rules() -> RuleSet {
    let on_all = |code: f64| {
        PRESET_TIMEFRAMES
            .iter()
            .map(|&tf| Condition::new(SIGNAL_COLUMN, Operator::Equal, lit(code)).on(tf))
            .collect()
    };
    RuleSet {
        buy: on_all(1.0),
        sell: on_all(-1.0),
    }
}

/// Evaluate `rules` on a single timeframe's table and store the result as
/// its `SIGNAL` column.
pub fn with_signal_column(
    table: IndicatorTable,
    rules: &RuleSet,
) -> Result<IndicatorTable, SignalError> {
    let aligned = AlignedTable::single(table);
    let verdicts = timeframe_verdicts(&aligned, rules)?;
    let signals = confluence(&verdicts, aligned.len());
    let mut table = aligned.table;
    table.insert_dense(
        SIGNAL_COLUMN,
        signals.into_iter().map(Signal::as_code).collect(),
    );
    Ok(table)
}

/// Attach the preset `SIGNAL` column when the table's timeframe has a preset.
pub fn attach_preset_signal(table: IndicatorTable) -> Result<IndicatorTable, SignalError> {
    match preset_rules(table.timeframe) {
        Some(rules) => with_signal_column(table, &rules),
        None => Ok(table),
    }
}
