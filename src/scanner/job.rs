//! One scanner job's background loop.
//!
//! A cycle lists the universe, evaluates it in batches of concurrently
//! spawned per-symbol tasks, and publishes an alert for every symbol whose
//! latest row signals BUY or SELL. Stop requests arrive on a watch channel
//! and are honoured between batches and during every wait.

use crate::domain::error::SignalError;
use crate::domain::ohlcv::Bar;
use crate::domain::pipeline::evaluate_strategy;
use crate::domain::signal::Signal;
use crate::domain::strategy::Strategy;
use crate::domain::universe::Universe;
use crate::ports::data_port::DataPort;
use crate::scanner::alert_bus::{Alert, AlertBus};
use crate::scanner::config::ScannerConfig;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Created,
    Running,
    Stopped,
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Created => "created",
            JobState::Running => "running",
            JobState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct ScannerJob {
    pub id: Uuid,
    pub strategy: Arc<Strategy>,
    pub timeframes: BTreeSet<u32>,
    pub state: JobState,
}

impl ScannerJob {
    /// The finest timeframe; conditions without a timeframe evaluate on it.
    pub fn base_timeframe(&self) -> u32 {
        self.timeframes.first().copied().unwrap_or_default()
    }
}

/// Latest-row outcome of one symbol's evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolSignal {
    pub symbol: String,
    pub signal: Signal,
    pub bar: Bar,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub evaluated: usize,
    pub alerts: usize,
    /// Symbols whose data source returned no bars.
    pub empty: usize,
    pub failures: usize,
}

/// Fetch every timeframe for `symbol`, evaluate `strategy` and return the
/// latest row's signal.
pub async fn scan_symbol(
    data: &dyn DataPort,
    strategy: &Strategy,
    timeframes: &BTreeSet<u32>,
    symbol: &str,
) -> Result<SymbolSignal, SignalError> {
    let mut bars_by_timeframe = BTreeMap::new();
    for &timeframe in timeframes {
        bars_by_timeframe.insert(timeframe, data.fetch_bars(symbol, timeframe).await?);
    }
    let base = timeframes.first().copied().unwrap_or_default();
    let evaluation = evaluate_strategy(&bars_by_timeframe, strategy, base)?;
    let latest = evaluation.latest().ok_or_else(|| SignalError::NoData {
        reason: format!("no rows evaluated for {symbol}"),
    })?;
    Ok(SymbolSignal {
        symbol: symbol.to_string(),
        signal: latest.signal,
        bar: Bar {
            timestamp: latest.timestamp,
            open: latest.open,
            high: latest.high,
            low: latest.low,
            close: latest.close,
            volume: latest.volume,
        },
    })
}

pub(crate) struct JobRunner {
    pub job: ScannerJob,
    pub data: Arc<dyn DataPort>,
    pub bus: AlertBus,
    pub config: ScannerConfig,
}

/// Sleep for `duration` unless cancelled first. Returns whether the job
/// should stop.
async fn wait_or_cancel(duration: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    if *cancel.borrow() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => *cancel.borrow(),
        changed = cancel.changed() => changed.is_err() || *cancel.borrow(),
    }
}

impl JobRunner {
    pub(crate) async fn run(self, mut cancel: watch::Receiver<bool>) {
        let job_id = self.job.id;
        info!(
            %job_id,
            strategy = %self.job.strategy.name,
            timeframes = ?self.job.timeframes,
            "scanner started"
        );

        loop {
            if *cancel.borrow() {
                break;
            }
            let report = self.run_cycle(&mut cancel).await;
            info!(
                %job_id,
                evaluated = report.evaluated,
                alerts = report.alerts,
                empty = report.empty,
                failures = report.failures,
                "scan cycle complete"
            );
            if wait_or_cancel(self.config.cycle_interval, &mut cancel).await {
                break;
            }
        }

        self.bus.close(job_id);
        info!(%job_id, "scanner stopped");
    }

    async fn universe(&self) -> Universe {
        match self.data.list_symbols().await {
            Ok(symbols) if !symbols.is_empty() => Universe::new(symbols),
            Ok(_) => {
                warn!(job_id = %self.job.id, "data source listed no symbols, using fallback list");
                Universe::new(self.config.fallback_symbols.clone())
            }
            Err(e) => {
                warn!(job_id = %self.job.id, error = %e, "failed to list symbols, using fallback list");
                Universe::new(self.config.fallback_symbols.clone())
            }
        }
    }

    pub(crate) async fn run_cycle(&self, cancel: &mut watch::Receiver<bool>) -> CycleReport {
        let mut report = CycleReport::default();
        let universe = self.universe().await;
        debug!(job_id = %self.job.id, symbols = universe.count(), "scan cycle starting");

        for (n, batch) in universe.batches(self.config.batch_size).into_iter().enumerate() {
            let stop = if n == 0 {
                *cancel.borrow()
            } else {
                wait_or_cancel(self.config.batch_pause, cancel).await
            };
            if stop {
                debug!(job_id = %self.job.id, batch = n, "stop requested, skipping remaining batches");
                break;
            }
            self.run_batch(batch, &mut report).await;
        }

        report
    }

    async fn run_batch(&self, batch: Vec<String>, report: &mut CycleReport) {
        let mut tasks = JoinSet::new();
        let mut symbols = HashMap::new();

        for symbol in batch {
            let data = Arc::clone(&self.data);
            let strategy = Arc::clone(&self.job.strategy);
            let timeframes = self.job.timeframes.clone();
            let task_symbol = symbol.clone();
            let handle = tasks.spawn(async move {
                scan_symbol(data.as_ref(), &strategy, &timeframes, &task_symbol).await
            });
            symbols.insert(handle.id(), symbol);
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            report.evaluated += 1;
            match joined {
                Ok((_, Ok(outcome))) => {
                    if outcome.signal.is_actionable() {
                        self.publish(outcome);
                        report.alerts += 1;
                    }
                }
                Ok((id, Err(SignalError::NoData { reason }))) => {
                    report.empty += 1;
                    let symbol = symbols.get(&id).map(String::as_str).unwrap_or("?");
                    debug!(job_id = %self.job.id, symbol, reason = %reason, "no data available, skipping");
                }
                Ok((id, Err(e))) => {
                    report.failures += 1;
                    let symbol = symbols.get(&id).map(String::as_str).unwrap_or("?");
                    let e = e.for_symbol(symbol);
                    warn!(job_id = %self.job.id, symbol, kind = e.kind(), error = %e, "symbol evaluation failed");
                }
                Err(join_error) => {
                    report.failures += 1;
                    let symbol = symbols
                        .get(&join_error.id())
                        .map(String::as_str)
                        .unwrap_or("?");
                    warn!(job_id = %self.job.id, symbol, error = %join_error, "symbol evaluation task panicked");
                }
            }
        }
    }

    fn publish(&self, outcome: SymbolSignal) {
        let alert = Alert {
            scanner_id: self.job.id,
            symbol: outcome.symbol,
            signal: outcome.signal,
            price: outcome.bar.close,
            timestamp: outcome.bar.timestamp,
            strategy_name: self.job.strategy.name.clone(),
        };
        let delivered = self.bus.publish(&alert);
        info!(
            job_id = %self.job.id,
            symbol = %alert.symbol,
            signal = %alert.signal,
            price = alert.price,
            delivered,
            "alert"
        );
    }
}
