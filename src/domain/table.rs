//! Column-oriented indicator tables.
//!
//! An [`IndicatorTable`] holds one timeframe's bars next to named indicator
//! columns of equal length. Values are `None` while an indicator is still
//! warming up.

use crate::domain::indicator::Series;
use crate::domain::ohlcv::Bar;
use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub bar: Bar,
    pub values: BTreeMap<String, Option<f64>>,
}

impl IndicatorRow {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    pub timeframe: u32,
    pub bars: Vec<Bar>,
    columns: BTreeMap<String, Series>,
}

impl IndicatorTable {
    pub fn new(timeframe: u32, bars: Vec<Bar>) -> Self {
        Self {
            timeframe,
            bars,
            columns: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn timestamp(&self, index: usize) -> DateTime<FixedOffset> {
        self.bars[index].timestamp
    }

    /// Insert or replace a column.
    ///
    /// # Panics
    ///
    /// Panics if the column length differs from the number of bars.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Series) {
        let name = name.into();
        assert_eq!(
            values.len(),
            self.bars.len(),
            "column {name} has {} values for {} bars",
            values.len(),
            self.bars.len()
        );
        self.columns.insert(name, values);
    }

    pub fn insert_dense(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.insert_column(name, values.into_iter().map(Some).collect());
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.columns.get(name).and_then(|c| c.get(index).copied().flatten())
    }

    pub fn row(&self, index: usize) -> Option<IndicatorRow> {
        let bar = self.bars.get(index)?.clone();
        let values = self
            .columns
            .iter()
            .map(|(name, series)| (name.clone(), series[index]))
            .collect();
        Some(IndicatorRow { bar, values })
    }

    pub fn last_row(&self) -> Option<IndicatorRow> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    /// Forward-fill every column, then backward-fill leading gaps.
    pub fn fill_gaps(&mut self) {
        for series in self.columns.values_mut() {
            fill_series(series);
        }
    }
}

/// Forward fill followed by backward fill of one series.
pub fn fill_series(series: &mut [Option<f64>]) {
    let mut last = None;
    for v in series.iter_mut() {
        match v {
            Some(x) => last = Some(*x),
            None => *v = last,
        }
    }

    let Some(first) = series.iter().flatten().next().copied() else {
        return;
    };
    for v in series.iter_mut() {
        match v {
            Some(_) => break,
            None => *v = Some(first),
        }
    }
}
