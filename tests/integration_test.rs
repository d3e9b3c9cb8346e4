//! End-to-end evaluation through the public pipeline: indicator tables per
//! timeframe, alignment onto the finest grid, rule verdicts and confluence.

mod common;

use common::*;
use mtfscan::adapters::csv_adapter::CsvAdapter;
use mtfscan::domain::pipeline::{
    PRESET_STRATEGY_NAME, evaluate_preset_confluence, evaluate_strategy,
};
use mtfscan::domain::rule::{Comparand, Condition, Operator, RuleSet};
use mtfscan::domain::signal::Signal;
use mtfscan::domain::strategy::Strategy;
use mtfscan::domain::time_range::TimeRange;
use mtfscan::ports::data_port::DataPort;
use std::collections::BTreeMap;

fn input(entries: Vec<(u32, Vec<Bar>)>) -> BTreeMap<u32, Vec<Bar>> {
    entries.into_iter().collect()
}

fn signals(evaluation: &mtfscan::domain::pipeline::Evaluation) -> Vec<Signal> {
    evaluation.rows.iter().map(|r| r.signal).collect()
}

fn close_vs(op: Operator, level: f64) -> Condition {
    Condition::new("CLOSE", op, Comparand::Literal(level))
}

#[test]
fn three_minute_preset_fires_once_on_the_breakout() {
    let strategy = Strategy::from_json(
        r#"{"name":"3m preset","buy_rules":[{"indicator":"SIGNAL","operator":"==","value":1,"timeframe":3}],
            "sell_rules":[{"indicator":"SIGNAL","operator":"==","value":-1,"timeframe":3}]}"#,
    )
    .unwrap();

    let evaluation =
        evaluate_strategy(&input(vec![(3, flat_then_rising(3))]), &strategy, 3).unwrap();

    let mut expected = vec![Signal::Hold; 10];
    expected[7] = Signal::Buy;
    assert_eq!(signals(&evaluation), expected);
    assert_eq!(evaluation.summary.buy, 1);
    assert_eq!(evaluation.summary.hold, 9);
    assert_eq!(evaluation.rows[7].timeframe_signals[&3], Signal::Buy);
}

#[test]
fn three_minute_preset_mirrors_on_the_breakdown() {
    let strategy = Strategy::from_json(
        r#"{"buy_rules":[{"indicator":"SIGNAL","operator":"==","value":1,"timeframe":3}],
            "sell_rules":[{"indicator":"SIGNAL","operator":"==","value":-1,"timeframe":3}]}"#,
    )
    .unwrap();
    assert_eq!(strategy.name, "Custom Strategy");

    let evaluation =
        evaluate_strategy(&input(vec![(3, flat_then_falling(3))]), &strategy, 3).unwrap();

    let mut expected = vec![Signal::Hold; 10];
    expected[7] = Signal::Sell;
    assert_eq!(signals(&evaluation), expected);
}

#[test]
fn higher_timeframe_condition_uses_last_completed_bar() {
    // 15m bars at 09:15 and 09:30 cover base rows 0..=4 and 5..=9.
    let base = trending_bars(10, 100.0, 3);
    let higher = bars_from_closes(&[100.0, 200.0], 15);
    let rules = RuleSet {
        buy: vec![close_vs(Operator::Greater, 150.0).on(15)],
        sell: vec![close_vs(Operator::Less, 150.0).on(15)],
    };
    let strategy = Strategy::new("htf", rules);

    let evaluation =
        evaluate_strategy(&input(vec![(3, base), (15, higher)]), &strategy, 3).unwrap();

    assert_eq!(evaluation.base_timeframe, 3);
    assert_eq!(evaluation.timeframes, vec![3, 15]);
    assert!(evaluation.columns.contains(&"CLOSE_15".to_string()));
    assert!(evaluation.columns.contains(&"EMA_9".to_string()));
    let got = signals(&evaluation);
    assert_eq!(&got[..5], &[Signal::Sell; 5]);
    assert_eq!(&got[5..], &[Signal::Buy; 5]);
    // only timeframes carrying conditions report a verdict
    assert_eq!(evaluation.rows[0].timeframe_signals.keys().collect::<Vec<_>>(), vec![&15]);
}

#[test]
fn confluence_requires_every_configured_timeframe() {
    let base = trending_bars(10, 100.0, 3);
    let higher = bars_from_closes(&[100.0, 200.0], 15);
    let rules = RuleSet {
        // base closes run 100..=109
        buy: vec![
            close_vs(Operator::Greater, 106.5),
            close_vs(Operator::Greater, 150.0).on(15),
        ],
        sell: vec![],
    };
    let evaluation = evaluate_strategy(
        &input(vec![(3, base), (15, higher)]),
        &Strategy::new("both", rules),
        3,
    )
    .unwrap();

    let got = signals(&evaluation);
    assert_eq!(&got[..7], &[Signal::Hold; 7]);
    assert_eq!(&got[7..], &[Signal::Buy; 3]);
    let row = &evaluation.rows[5];
    assert_eq!(row.timeframe_signals[&3], Signal::Hold);
    assert_eq!(row.timeframe_signals[&15], Signal::Buy);
}

#[test]
fn unknown_indicator_is_reported() {
    let rules = RuleSet {
        buy: vec![Condition::new("VWAP", Operator::Greater, Comparand::Literal(1.0))],
        sell: vec![],
    };
    let err = evaluate_strategy(
        &input(vec![(3, trending_bars(5, 10.0, 3))]),
        &Strategy::new("bad", rules),
        3,
    )
    .unwrap_err();
    match err {
        SignalError::UnknownIndicator { name, available } => {
            assert_eq!(name, "VWAP");
            assert!(!available.is_empty());
            assert!(available.len() <= 20);
        }
        other => panic!("expected UnknownIndicator, got {other:?}"),
    }
}

#[test]
fn missing_timeframe_bars_is_misconfiguration() {
    let rules = RuleSet {
        buy: vec![close_vs(Operator::Greater, 1.0).on(15)],
        sell: vec![],
    };
    let err = evaluate_strategy(
        &input(vec![(3, trending_bars(5, 10.0, 3))]),
        &Strategy::new("x", rules),
        3,
    )
    .unwrap_err();
    assert!(matches!(err, SignalError::MisconfiguredRule { .. }));
}

#[test]
fn empty_base_is_no_data() {
    let rules = RuleSet {
        buy: vec![close_vs(Operator::Greater, 1.0)],
        sell: vec![],
    };
    let err = evaluate_strategy(&input(vec![(3, Vec::new())]), &Strategy::new("x", rules), 3)
        .unwrap_err();
    assert!(matches!(err, SignalError::NoData { .. }));
}

#[test]
fn preset_confluence_holds_when_timeframes_disagree() {
    // 3m breaks out, but neither the 5m nor the 15m preset fires.
    let bars = input(vec![
        (3, flat_then_rising(3)),
        (5, trending_bars(6, 10.0, 5)),
        (15, trending_bars(2, 10.0, 15)),
    ]);
    let evaluation = evaluate_preset_confluence(&bars).unwrap();

    assert_eq!(evaluation.strategy_name, PRESET_STRATEGY_NAME);
    assert_eq!(evaluation.timeframes, vec![3, 5, 15]);
    for column in ["SIGNAL", "SIGNAL_5", "SIGNAL_15"] {
        assert!(evaluation.columns.contains(&column.to_string()), "{column}");
    }
    assert_eq!(evaluation.rows.len(), 10);
    assert_eq!(evaluation.rows[7].timeframe_signals[&3], Signal::Buy);
    assert!(signals(&evaluation).iter().all(|s| *s == Signal::Hold));
}

#[test]
fn time_range_filters_rows_after_evaluation() {
    let rules = RuleSet {
        buy: vec![close_vs(Operator::Greater, 0.0)],
        sell: vec![],
    };
    let evaluation = evaluate_strategy(
        &input(vec![(3, trending_bars(10, 10.0, 3))]),
        &Strategy::new("all", rules),
        3,
    )
    .unwrap();
    let range = TimeRange::parse("2024-01-15T09:21:00+05:30", "2024-01-15T09:27:00+05:30").unwrap();

    let filtered = evaluation.within(&range);
    assert_eq!(filtered.rows.len(), 3);
    assert_eq!(filtered.summary.total, 3);
    assert_eq!(filtered.summary.buy, 3);
    assert_eq!(filtered.rows[0].close, 12.0);
}

#[test]
fn evaluation_serialises_signals_as_words() {
    let rules = RuleSet {
        buy: vec![close_vs(Operator::Greater, 0.0)],
        sell: vec![],
    };
    let evaluation = evaluate_strategy(
        &input(vec![(3, trending_bars(3, 10.0, 3))]),
        &Strategy::new("json", rules),
        3,
    )
    .unwrap();
    let json = serde_json::to_value(&evaluation).unwrap();
    assert_eq!(json["rows"][0]["signal"], "BUY");
    assert_eq!(json["summary"]["buy"], 3);
    assert_eq!(json["strategy_name"], "json");
}

#[tokio::test]
async fn csv_directory_feeds_the_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let mut csv = String::from("timestamp,open,high,low,close,volume\n");
    for bar in trending_bars(30, 100.0, 1) {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.timestamp.to_rfc3339(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    std::fs::write(dir.path().join("NIFTY_1m.csv"), csv).unwrap();

    let adapter = CsvAdapter::new(dir.path().to_path_buf());
    // 3m and 15m have no files and are resampled from 1m
    let mut bars = BTreeMap::new();
    for tf in [3, 15] {
        bars.insert(tf, adapter.fetch_bars("NIFTY", tf).await.unwrap());
    }
    assert_eq!(bars[&3].len(), 10);
    assert_eq!(bars[&15].len(), 2);
    assert_eq!(bars[&3][0].close, 102.0);

    // 15m closes are 114 then 129
    let rules = RuleSet {
        buy: vec![close_vs(Operator::Greater, 120.0).on(15)],
        sell: vec![],
    };
    let evaluation = evaluate_strategy(&bars, &Strategy::new("csv", rules), 3).unwrap();
    let got = signals(&evaluation);
    assert_eq!(&got[..5], &[Signal::Hold; 5]);
    assert_eq!(&got[5..], &[Signal::Buy; 5]);
}
