//! Background scanners that re-evaluate a strategy across a symbol universe
//! on a fixed cadence and publish alerts.
//!
//! Each started job owns one tokio task. The [`ScannerManager`] keeps the
//! job table and the cancellation handle of every job; jobs share nothing
//! else.

pub mod alert_bus;
pub mod config;
pub mod job;

use crate::domain::error::SignalError;
use crate::domain::strategy::Strategy;
use crate::ports::data_port::DataPort;
use alert_bus::{Alert, AlertBus};
use config::ScannerConfig;
use job::{JobRunner, JobState, ScannerJob};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

struct JobEntry {
    job: ScannerJob,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

/// Timeframes a scan fetches: every one a condition names.
fn scan_timeframes(strategy: &Strategy) -> Result<BTreeSet<u32>, SignalError> {
    if !strategy.rules.has_explicit_timeframe() {
        return Err(SignalError::MisconfiguredRule {
            reason: "strategy must have at least one rule with a timeframe".to_string(),
        });
    }
    Ok(strategy
        .rules
        .all_conditions()
        .filter_map(|c| c.timeframe)
        .collect())
}

pub struct ScannerManager {
    data: Arc<dyn DataPort>,
    bus: AlertBus,
    config: ScannerConfig,
    jobs: Mutex<HashMap<Uuid, JobEntry>>,
}

impl ScannerManager {
    pub fn new(data: Arc<dyn DataPort>, bus: AlertBus, config: ScannerConfig) -> Self {
        Self {
            data,
            bus,
            config,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn bus(&self) -> &AlertBus {
        &self.bus
    }

    fn jobs(&self) -> MutexGuard<'_, HashMap<Uuid, JobEntry>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start scanning with `strategy` and return the new job's id.
    ///
    /// At least one condition must name a timeframe; the finest named
    /// timeframe becomes the base for conditions that name none.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, strategy: Strategy) -> Result<Uuid, SignalError> {
        let timeframes = scan_timeframes(&strategy)?;
        Ok(self.launch(Uuid::new_v4(), strategy, timeframes))
    }

    /// Like [`start`](Self::start), but subscribes to the job's alerts before
    /// its task is spawned so no first-cycle alert is missed.
    pub fn start_subscribed(
        &self,
        strategy: Strategy,
    ) -> Result<(Uuid, UnboundedReceiver<Alert>), SignalError> {
        let timeframes = scan_timeframes(&strategy)?;
        let id = Uuid::new_v4();
        let alerts = self.bus.subscribe(id);
        Ok((self.launch(id, strategy, timeframes), alerts))
    }

    fn launch(&self, id: Uuid, strategy: Strategy, timeframes: BTreeSet<u32>) -> Uuid {
        let mut job = ScannerJob {
            id,
            strategy: Arc::new(strategy),
            timeframes,
            state: JobState::Created,
        };
        let (cancel, cancel_rx) = watch::channel(false);
        let runner = JobRunner {
            job: job.clone(),
            data: Arc::clone(&self.data),
            bus: self.bus.clone(),
            config: self.config.clone(),
        };
        let task = tokio::spawn(runner.run(cancel_rx));
        job.state = JobState::Running;

        info!(job_id = %id, strategy = %job.strategy.name, "scanner job created");
        self.jobs().insert(
            id,
            JobEntry {
                job,
                cancel,
                task: Some(task),
            },
        );
        id
    }

    /// Request a running job to stop. Returns false for unknown or already
    /// stopped jobs. A batch already in flight finishes; nothing after it runs.
    pub fn stop(&self, id: Uuid) -> bool {
        let mut jobs = self.jobs();
        let Some(entry) = jobs.get_mut(&id) else {
            return false;
        };
        if entry.job.state != JobState::Running {
            return false;
        }
        entry.job.state = JobState::Stopped;
        // the receiver may already be gone if the task ended
        let _ = entry.cancel.send(true);
        info!(job_id = %id, "scanner stop requested");
        true
    }

    pub fn state(&self, id: Uuid) -> Option<JobState> {
        self.jobs().get(&id).map(|e| e.job.state)
    }

    pub fn job(&self, id: Uuid) -> Option<ScannerJob> {
        self.jobs().get(&id).map(|e| e.job.clone())
    }

    pub fn job_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.jobs().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Stop `id` and wait for its task to exit. Once it has, every
    /// subscriber of the job sees its channel close.
    pub async fn stop_and_wait(&self, id: Uuid) -> bool {
        let stopped = self.stop(id);
        let task = self.jobs().get_mut(&id).and_then(|e| e.task.take());
        if let Some(task) = task {
            let _ = task.await;
        }
        stopped
    }

    /// Stop every job and wait for all of their tasks.
    pub async fn shutdown(&self) {
        for id in self.job_ids() {
            self.stop_and_wait(id).await;
        }
    }
}
