//! One-shot evaluation: indicators, alignment, verdicts and confluence for
//! one symbol's bars.

use crate::domain::align::{AlignedTable, align_timeframes};
use crate::domain::error::SignalError;
use crate::domain::indicator::compute_indicators;
use crate::domain::ohlcv::Bar;
use crate::domain::presets::{PRESET_TIMEFRAMES, attach_preset_signal, preset_confluence_rules};
use crate::domain::rule::{Comparand, RuleSet};
use crate::domain::rule_eval::timeframe_verdicts;
use crate::domain::signal::{Signal, confluence, per_timeframe_signal};
use crate::domain::strategy::Strategy;
use crate::domain::table::IndicatorTable;
use crate::domain::time_range::TimeRange;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::BTreeMap;

pub const PRESET_STRATEGY_NAME: &str = "Multi-Timeframe Confluence";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRow {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Signal of each configured timeframe on its own, keyed by minutes.
    pub timeframe_signals: BTreeMap<u32, Signal>,
    /// Values of the columns the conditions read, by resolved column name.
    pub indicators: BTreeMap<String, Option<f64>>,
    pub signal: Signal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalSummary {
    pub total: usize,
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
}

impl SignalSummary {
    pub fn from_signals(signals: impl IntoIterator<Item = Signal>) -> Self {
        signals
            .into_iter()
            .fold(SignalSummary::default(), |mut acc, signal| {
                acc.total += 1;
                match signal {
                    Signal::Buy => acc.buy += 1,
                    Signal::Sell => acc.sell += 1,
                    Signal::Hold => acc.hold += 1,
                }
                acc
            })
    }

    pub fn from_rows(rows: &[EvaluationRow]) -> Self {
        Self::from_signals(rows.iter().map(|r| r.signal))
    }

    /// Counts of each timeframe's own signal across `rows`.
    pub fn per_timeframe(rows: &[EvaluationRow]) -> BTreeMap<u32, SignalSummary> {
        let timeframes = rows
            .first()
            .map(|r| r.timeframe_signals.keys().copied().collect::<Vec<_>>())
            .unwrap_or_default();
        timeframes
            .into_iter()
            .map(|tf| {
                let signals = rows
                    .iter()
                    .map(|r| r.timeframe_signals.get(&tf).copied().unwrap_or(Signal::Hold));
                (tf, Self::from_signals(signals))
            })
            .collect()
    }
}

/// Textual buy and sell conditions evaluated on one timeframe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeframeConditions {
    pub buy: Vec<String>,
    pub sell: Vec<String>,
}

/// Group the rule set's conditions by the timeframe they evaluate on.
pub fn conditions_by_timeframe(rules: &RuleSet, base: u32) -> BTreeMap<u32, TimeframeConditions> {
    let mut grouped: BTreeMap<u32, TimeframeConditions> = BTreeMap::new();
    for c in &rules.buy {
        grouped.entry(c.timeframe_or(base)).or_default().buy.push(c.to_string());
    }
    for c in &rules.sell {
        grouped.entry(c.timeframe_or(base)).or_default().sell.push(c.to_string());
    }
    grouped
}

/// Resolved names of every column a condition reads.
fn condition_columns(aligned: &AlignedTable, rules: &RuleSet) -> Vec<String> {
    let mut names = Vec::new();
    for c in rules.all_conditions() {
        let timeframe = c.timeframe_or(aligned.base_timeframe);
        names.push(aligned.column_name(&c.indicator.trim().to_uppercase(), timeframe));
        if let Comparand::Column(other) = &c.comparand {
            names.push(aligned.column_name(&other.trim().to_uppercase(), timeframe));
        }
    }
    names.sort();
    names.dedup();
    names.retain(|name| aligned.table.has_column(name));
    names
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub strategy_name: String,
    pub base_timeframe: u32,
    pub timeframes: Vec<u32>,
    pub columns: Vec<String>,
    /// Conditions of each configured timeframe, keyed by minutes.
    pub conditions_by_timeframe: BTreeMap<u32, TimeframeConditions>,
    pub rows: Vec<EvaluationRow>,
    pub summary: SignalSummary,
    pub timeframe_summaries: BTreeMap<u32, SignalSummary>,
}

impl Evaluation {
    pub fn latest(&self) -> Option<&EvaluationRow> {
        self.rows.last()
    }

    pub fn latest_signal(&self) -> Signal {
        self.latest().map(|r| r.signal).unwrap_or(Signal::Hold)
    }

    /// Drop rows outside `range`. Indicators were already computed over the
    /// full history, so warmup is unaffected.
    pub fn within(mut self, range: &TimeRange) -> Self {
        self.rows.retain(|row| range.contains(row.timestamp));
        self.summary = SignalSummary::from_rows(&self.rows);
        self.timeframe_summaries = SignalSummary::per_timeframe(&self.rows);
        self
    }
}

fn timeframe_table(
    bars_by_timeframe: &BTreeMap<u32, Vec<Bar>>,
    timeframe: u32,
) -> Result<IndicatorTable, SignalError> {
    let bars = bars_by_timeframe
        .get(&timeframe)
        .ok_or_else(|| SignalError::MisconfiguredRule {
            reason: format!("no bars supplied for timeframe {timeframe}m"),
        })?;
    if bars.is_empty() {
        return Ok(IndicatorTable::new(timeframe, Vec::new()));
    }
    attach_preset_signal(compute_indicators(bars, timeframe)?)
}

/// Evaluate `strategy` over the supplied bars.
///
/// The timeframes computed are `base_interval` plus every timeframe a
/// condition names; conditions without a timeframe apply to the finest one.
pub fn evaluate_strategy(
    bars_by_timeframe: &BTreeMap<u32, Vec<Bar>>,
    strategy: &Strategy,
    base_interval: u32,
) -> Result<Evaluation, SignalError> {
    let tables = strategy
        .rules
        .timeframes(base_interval)
        .into_iter()
        .map(|tf| Ok((tf, timeframe_table(bars_by_timeframe, tf)?)))
        .collect::<Result<BTreeMap<_, _>, SignalError>>()?;

    let aligned = align_timeframes(tables)?;
    let verdicts = timeframe_verdicts(&aligned, &strategy.rules)?;
    let signals = confluence(&verdicts, aligned.len());
    let per_timeframe: Vec<(u32, Vec<Signal>)> = verdicts
        .iter()
        .map(|v| (v.timeframe, per_timeframe_signal(v)))
        .collect();
    let used_columns = condition_columns(&aligned, &strategy.rules);

    let rows: Vec<EvaluationRow> = aligned
        .table
        .bars
        .iter()
        .zip(&signals)
        .enumerate()
        .map(|(i, (bar, signal))| EvaluationRow {
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            timeframe_signals: per_timeframe
                .iter()
                .map(|(tf, s)| (*tf, s[i]))
                .collect(),
            indicators: used_columns
                .iter()
                .map(|name| (name.clone(), aligned.table.value(name, i)))
                .collect(),
            signal: *signal,
        })
        .collect();

    Ok(Evaluation {
        strategy_name: strategy.name.clone(),
        base_timeframe: aligned.base_timeframe,
        timeframes: aligned.timeframes.clone(),
        columns: aligned.table.column_names().map(str::to_string).collect(),
        conditions_by_timeframe: conditions_by_timeframe(&strategy.rules, aligned.base_timeframe),
        summary: SignalSummary::from_rows(&rows),
        timeframe_summaries: SignalSummary::per_timeframe(&rows),
        rows,
    })
}

/// The built-in 3/5/15-minute confluence strategy.
pub fn evaluate_preset_confluence(
    bars_by_timeframe: &BTreeMap<u32, Vec<Bar>>,
) -> Result<Evaluation, SignalError> {
    let strategy = Strategy::new(PRESET_STRATEGY_NAME, preset_confluence_rules());
    evaluate_strategy(bars_by_timeframe, &strategy, PRESET_TIMEFRAMES[0])
}
