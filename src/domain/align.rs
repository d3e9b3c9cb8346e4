//! Cross-timeframe alignment.
//!
//! Merges several timeframes' indicator tables onto the grid of the finest
//! (base) timeframe with an as-of join: each base row sees the most recent
//! coarser row whose timestamp is at or before its own. Columns from a
//! non-base timeframe are suffixed with its minutes, so `RSI` on the
//! 15-minute table becomes `RSI_15`.

use crate::domain::error::SignalError;
use crate::domain::table::IndicatorTable;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    pub base_timeframe: u32,
    /// Timeframes whose columns are present, ascending. Always includes the base.
    pub timeframes: Vec<u32>,
    pub table: IndicatorTable,
}

impl AlignedTable {
    /// Wrap a single timeframe's table without merging anything.
    pub fn single(table: IndicatorTable) -> Self {
        Self {
            base_timeframe: table.timeframe,
            timeframes: vec![table.timeframe],
            table,
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn has_timeframe(&self, timeframe: u32) -> bool {
        self.timeframes.contains(&timeframe)
    }

    /// Column name of `name` as seen from the base grid.
    pub fn column_name(&self, name: &str, timeframe: u32) -> String {
        suffixed(name, timeframe, self.base_timeframe)
    }
}

pub fn suffixed(name: &str, timeframe: u32, base_timeframe: u32) -> String {
    if timeframe == base_timeframe {
        name.to_string()
    } else {
        format!("{name}_{timeframe}")
    }
}

/// For each base timestamp, the index of the latest `other` row at or before it.
fn as_of_indices(base: &IndicatorTable, other: &IndicatorTable) -> Vec<Option<usize>> {
    let mut out = Vec::with_capacity(base.len());
    let mut cursor: Option<usize> = None;
    let mut next = 0;

    for bar in &base.bars {
        while next < other.len() && other.bars[next].timestamp <= bar.timestamp {
            cursor = Some(next);
            next += 1;
        }
        out.push(cursor);
    }
    out
}

pub fn align_timeframes(
    mut tables: BTreeMap<u32, IndicatorTable>,
) -> Result<AlignedTable, SignalError> {
    let Some((base_timeframe, mut merged)) = tables.pop_first() else {
        return Err(SignalError::NoData {
            reason: "no timeframes to align".to_string(),
        });
    };
    if merged.is_empty() {
        return Err(SignalError::NoData {
            reason: format!("base timeframe {base_timeframe}m has no bars"),
        });
    }

    let mut timeframes = vec![base_timeframe];
    for (timeframe, other) in &tables {
        if other.is_empty() {
            continue;
        }
        let indices = as_of_indices(&merged, other);
        for (name, values) in other.columns() {
            let aligned = indices.iter().map(|i| i.and_then(|i| values[i])).collect();
            merged.insert_column(suffixed(name, *timeframe, base_timeframe), aligned);
        }
        timeframes.push(*timeframe);
    }

    merged.fill_gaps();
    Ok(AlignedTable {
        base_timeframe,
        timeframes,
        table: merged,
    })
}
