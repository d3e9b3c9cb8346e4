//! Best-effort fanout of scanner alerts.
//!
//! Subscribers register per scanner job. Publishing never blocks: each
//! subscriber owns an unbounded channel and a subscriber whose receiver has
//! been dropped is removed on the next publish. There is no replay.

use crate::domain::signal::Signal;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub scanner_id: Uuid,
    pub symbol: String,
    pub signal: Signal,
    pub price: f64,
    pub timestamp: DateTime<FixedOffset>,
    pub strategy_name: String,
}

type Subscribers = HashMap<Uuid, Vec<mpsc::UnboundedSender<Alert>>>;

#[derive(Clone, Default)]
pub struct AlertBus {
    subscribers: Arc<Mutex<Subscribers>>,
}

impl AlertBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, job_id: Uuid) -> mpsc::UnboundedReceiver<Alert> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().entry(job_id).or_default().push(tx);
        rx
    }

    /// Deliver `alert` to every live subscriber of its job and return how
    /// many received it.
    pub fn publish(&self, alert: &Alert) -> usize {
        let mut subscribers = self.lock();
        let Some(senders) = subscribers.get_mut(&alert.scanner_id) else {
            return 0;
        };
        senders.retain(|tx| tx.send(alert.clone()).is_ok());
        senders.len()
    }

    pub fn subscriber_count(&self, job_id: Uuid) -> usize {
        self.lock().get(&job_id).map_or(0, Vec::len)
    }

    /// Drop every subscriber of `job_id`; their receivers see the channel close.
    pub fn close(&self, job_id: Uuid) {
        self.lock().remove(&job_id);
    }
}
