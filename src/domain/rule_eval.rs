//! Condition evaluation over an aligned table.
//!
//! # Evaluation Semantics
//!
//! - Column names are upper-cased, then suffixed for non-base timeframes
//! - `>`, `<`, `>=`, `<=`, `==`: elementwise; any undefined operand is `false`
//! - `==` is exact float equality
//! - `crosses_above`: `a[i] > b[i]` and `a[i-1] <= b[i-1]`, `false` at row 0
//! - `crosses_below`: mirror of `crosses_above`
//! - Conditions for one timeframe and direction are ANDed; none means `false`

use crate::domain::align::AlignedTable;
use crate::domain::error::SignalError;
use crate::domain::rule::{Comparand, Condition, Operator, RuleSet};
use std::collections::BTreeMap;

/// Number of column names listed in an unknown-indicator error.
pub const MAX_LISTED_COLUMNS: usize = 20;

/// Buy and sell verdicts for one configured timeframe.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeframeVerdict {
    pub timeframe: u32,
    pub buy: Vec<bool>,
    pub sell: Vec<bool>,
}

pub fn resolve_column<'a>(
    aligned: &'a AlignedTable,
    name: &str,
    timeframe: u32,
) -> Result<&'a [Option<f64>], SignalError> {
    if !aligned.has_timeframe(timeframe) {
        return Err(SignalError::MisconfiguredRule {
            reason: format!(
                "timeframe {timeframe}m is not among the aligned timeframes {:?}",
                aligned.timeframes
            ),
        });
    }
    let column = aligned.column_name(&name.trim().to_uppercase(), timeframe);
    aligned
        .table
        .column(&column)
        .ok_or_else(|| SignalError::UnknownIndicator {
            name: column,
            available: aligned
                .table
                .column_names()
                .take(MAX_LISTED_COLUMNS)
                .map(str::to_string)
                .collect(),
        })
}

fn compare(op: Operator, a: Option<f64>, b: Option<f64>) -> bool {
    let (Some(a), Some(b)) = (a, b) else {
        return false;
    };
    match op {
        Operator::Greater => a > b,
        Operator::Less => a < b,
        Operator::GreaterEq => a >= b,
        Operator::LessEq => a <= b,
        Operator::Equal => a == b,
        Operator::CrossesAbove | Operator::CrossesBelow => false,
    }
}

/// Elementwise verdict of one operator over two aligned series.
pub fn apply_operator(op: Operator, left: &[Option<f64>], right: &[Option<f64>]) -> Vec<bool> {
    (0..left.len())
        .map(|i| match op {
            Operator::CrossesAbove => {
                i > 0
                    && compare(Operator::Greater, left[i], right[i])
                    && compare(Operator::LessEq, left[i - 1], right[i - 1])
            }
            Operator::CrossesBelow => {
                i > 0
                    && compare(Operator::Less, left[i], right[i])
                    && compare(Operator::GreaterEq, left[i - 1], right[i - 1])
            }
            _ => compare(op, left[i], right[i]),
        })
        .collect()
}

pub fn evaluate_condition(
    aligned: &AlignedTable,
    condition: &Condition,
) -> Result<Vec<bool>, SignalError> {
    let timeframe = condition.timeframe_or(aligned.base_timeframe);
    let left = resolve_column(aligned, &condition.indicator, timeframe)?;
    let literal;
    let right: &[Option<f64>] = match &condition.comparand {
        Comparand::Literal(v) => {
            literal = vec![Some(*v); left.len()];
            &literal
        }
        Comparand::Column(name) => resolve_column(aligned, name, timeframe)?,
    };
    Ok(apply_operator(condition.operator, left, right))
}

/// AND of every condition; an empty list is all-false.
pub fn evaluate_conditions<'c, I>(aligned: &AlignedTable, conditions: I) -> Result<Vec<bool>, SignalError>
where
    I: IntoIterator<Item = &'c Condition>,
{
    let mut result: Option<Vec<bool>> = None;
    for condition in conditions {
        let verdict = evaluate_condition(aligned, condition)?;
        result = Some(match result {
            None => verdict,
            Some(acc) => acc.iter().zip(&verdict).map(|(a, b)| *a && *b).collect(),
        });
    }
    Ok(result.unwrap_or_else(|| vec![false; aligned.len()]))
}

/// Buy and sell verdicts for every timeframe the rule set configures.
pub fn timeframe_verdicts(
    aligned: &AlignedTable,
    rules: &RuleSet,
) -> Result<Vec<TimeframeVerdict>, SignalError> {
    let base = aligned.base_timeframe;
    let mut grouped: BTreeMap<u32, (Vec<&Condition>, Vec<&Condition>)> = rules
        .configured_timeframes(base)
        .into_iter()
        .map(|tf| (tf, (Vec::new(), Vec::new())))
        .collect();
    for c in &rules.buy {
        if let Some(entry) = grouped.get_mut(&c.timeframe_or(base)) {
            entry.0.push(c);
        }
    }
    for c in &rules.sell {
        if let Some(entry) = grouped.get_mut(&c.timeframe_or(base)) {
            entry.1.push(c);
        }
    }

    grouped
        .into_iter()
        .map(|(timeframe, (buy, sell))| {
            Ok(TimeframeVerdict {
                timeframe,
                buy: evaluate_conditions(aligned, buy)?,
                sell: evaluate_conditions(aligned, sell)?,
            })
        })
        .collect()
}
