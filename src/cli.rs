//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::error::SignalError;
use crate::domain::indicator::{OPERATORS, available_columns};
use crate::domain::ohlcv::Bar;
use crate::domain::pipeline::{Evaluation, evaluate_preset_confluence, evaluate_strategy};
use crate::domain::presets::PRESET_TIMEFRAMES;
use crate::domain::rule::Condition;
use crate::domain::strategy::{DEFAULT_STRATEGY_NAME, Strategy};
use crate::domain::time_range::TimeRange;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::scanner::ScannerManager;
use crate::scanner::alert_bus::AlertBus;
use crate::scanner::config::ScannerConfig;

#[derive(Parser, Debug)]
#[command(name = "mtfscan", about = "Multi-timeframe indicator signals and scanner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List indicator columns and condition operators
    Indicators,
    /// Validate a strategy file
    Validate {
        #[arg(short, long)]
        strategy: PathBuf,
    },
    /// Evaluate a strategy for one symbol
    Evaluate {
        /// Directory of `{SYMBOL}_{MINUTES}m.csv` files
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        /// Extra buy condition, e.g. "EMA_5 crosses_above EMA_9 @ 3"
        #[arg(long)]
        buy: Vec<String>,
        #[arg(long)]
        sell: Vec<String>,
        /// Base interval in minutes
        #[arg(short, long, default_value_t = 3)]
        interval: u32,
        #[arg(long, requires = "end")]
        start: Option<String>,
        #[arg(long, requires = "start")]
        end: Option<String>,
    },
    /// Evaluate the built-in 3/5/15-minute confluence strategy
    Confluence {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long, requires = "end")]
        start: Option<String>,
        #[arg(long, requires = "start")]
        end: Option<String>,
    },
    /// Scan the configured universe until interrupted, printing alerts as JSON lines
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        strategy: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Indicators => {
            print_catalogue();
            Ok(())
        }
        Command::Validate { strategy } => run_validate(&strategy),
        Command::Evaluate {
            data,
            symbol,
            strategy,
            buy,
            sell,
            interval,
            start,
            end,
        } => run_evaluate(
            &data,
            &symbol,
            strategy.as_deref(),
            &buy,
            &sell,
            interval,
            start.as_deref().zip(end.as_deref()),
        ),
        Command::Confluence {
            data,
            symbol,
            start,
            end,
        } => run_confluence(&data, &symbol, start.as_deref().zip(end.as_deref())),
        Command::Scan { config, strategy } => run_scan(&config, &strategy),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(&e)
        }
    }
}

fn print_catalogue() {
    println!("Columns:");
    for name in available_columns() {
        println!("  {name}");
    }
    println!("Operators:");
    for op in OPERATORS {
        println!("  {op}");
    }
}

/// Load a strategy from an optional JSON file and append textual conditions.
pub fn load_strategy(
    path: Option<&Path>,
    buy: &[String],
    sell: &[String],
) -> Result<Strategy, SignalError> {
    let mut strategy = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Strategy::from_json(&content)?
        }
        None => Strategy::new(DEFAULT_STRATEGY_NAME, Default::default()),
    };
    for text in buy {
        strategy.rules.buy.push(parse_condition_arg(text)?);
    }
    for text in sell {
        strategy.rules.sell.push(parse_condition_arg(text)?);
    }
    Ok(strategy)
}

fn parse_condition_arg(text: &str) -> Result<Condition, SignalError> {
    text.parse::<Condition>().map_err(|e| {
        eprintln!("{}", e.display_with_context(text));
        SignalError::from(e)
    })
}

fn run_validate(path: &Path) -> Result<(), SignalError> {
    let strategy = load_strategy(Some(path), &[], &[])?;
    eprintln!("Strategy: {}", strategy.name);
    eprintln!("  buy rules:");
    for c in &strategy.rules.buy {
        eprintln!("    {c}");
    }
    eprintln!("  sell rules:");
    for c in &strategy.rules.sell {
        eprintln!("    {c}");
    }

    let known = available_columns();
    for c in strategy.rules.all_conditions() {
        let name = c.indicator.to_uppercase();
        if !known.contains(&name) && !name.starts_with("SIGNAL") {
            eprintln!("warning: {name} is not a built-in column");
        }
    }
    if !strategy.rules.has_explicit_timeframe() {
        eprintln!("note: no rule names a timeframe; this strategy cannot be scanned");
    }
    eprintln!("Strategy validated successfully");
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime, SignalError> {
    Ok(tokio::runtime::Runtime::new()?)
}

/// Fetch bars for each timeframe in `timeframes`.
pub async fn fetch_timeframes(
    data: &dyn DataPort,
    symbol: &str,
    timeframes: &BTreeSet<u32>,
) -> Result<BTreeMap<u32, Vec<Bar>>, SignalError> {
    let mut out = BTreeMap::new();
    for &tf in timeframes {
        out.insert(tf, data.fetch_bars(symbol, tf).await?);
    }
    Ok(out)
}

fn print_evaluation(evaluation: Evaluation, range: Option<(&str, &str)>) -> Result<(), SignalError> {
    let evaluation = match range {
        Some((start, end)) => evaluation.within(&TimeRange::parse(start, end)?),
        None => evaluation,
    };
    let json = serde_json::to_string_pretty(&evaluation).map_err(|e| SignalError::MalformedInput {
        reason: format!("serialising evaluation: {e}"),
    })?;
    println!("{json}");

    let s = evaluation.summary;
    eprintln!(
        "{}: {} rows, {} buy, {} sell, {} hold; latest {}",
        evaluation.strategy_name,
        s.total,
        s.buy,
        s.sell,
        s.hold,
        evaluation.latest_signal()
    );
    for (timeframe, s) in &evaluation.timeframe_summaries {
        eprintln!("  {timeframe}m: {} buy, {} sell, {} hold", s.buy, s.sell, s.hold);
    }
    Ok(())
}

fn run_evaluate(
    data_dir: &Path,
    symbol: &str,
    strategy_path: Option<&Path>,
    buy: &[String],
    sell: &[String],
    interval: u32,
    range: Option<(&str, &str)>,
) -> Result<(), SignalError> {
    let strategy = load_strategy(strategy_path, buy, sell)?;
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let timeframes = strategy.rules.timeframes(interval);
    let bars = runtime()?.block_on(fetch_timeframes(&adapter, symbol, &timeframes))?;
    print_evaluation(evaluate_strategy(&bars, &strategy, interval)?, range)
}

fn run_confluence(
    data_dir: &Path,
    symbol: &str,
    range: Option<(&str, &str)>,
) -> Result<(), SignalError> {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let timeframes: BTreeSet<u32> = PRESET_TIMEFRAMES.into_iter().collect();
    let bars = runtime()?.block_on(fetch_timeframes(&adapter, symbol, &timeframes))?;
    print_evaluation(evaluate_preset_confluence(&bars)?, range)
}

/// `[data] csv_dir` from the configuration.
pub fn data_dir(config: &dyn ConfigPort) -> Result<PathBuf, SignalError> {
    config
        .get_string("data", "csv_dir")
        .map(PathBuf::from)
        .ok_or_else(|| SignalError::ConfigInvalid {
            section: "data".to_string(),
            key: "csv_dir".to_string(),
            reason: "missing".to_string(),
        })
}

fn run_scan(config_path: &Path, strategy_path: &Path) -> Result<(), SignalError> {
    let config = FileConfigAdapter::from_file(config_path)?;
    let scanner_config = ScannerConfig::from_config(&config)?;
    let data: Arc<dyn DataPort> = Arc::new(CsvAdapter::new(data_dir(&config)?));
    let strategy = load_strategy(Some(strategy_path), &[], &[])?;

    runtime()?.block_on(async move {
        let manager = ScannerManager::new(data, AlertBus::new(), scanner_config);
        let (id, mut alerts) = manager.start_subscribed(strategy)?;
        eprintln!("Scanner {id} running; press Ctrl-C to stop");

        loop {
            tokio::select! {
                alert = alerts.recv() => {
                    let Some(alert) = alert else { break };
                    let line = serde_json::to_string(&alert).map_err(|e| SignalError::MalformedInput {
                        reason: format!("serialising alert: {e}"),
                    })?;
                    let mut out = std::io::stdout().lock();
                    writeln!(out, "{line}")?;
                    out.flush()?;
                }
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    break;
                }
            }
        }

        manager.shutdown().await;
        eprintln!("Scanner {id} stopped");
        Ok::<(), SignalError>(())
    })
}
