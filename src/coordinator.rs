// src/coordinator.rs
//! Owns the latest accepted article and publishes every change over a
//! `watch` channel. One writer (the refresh path), any number of readers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::sync::{watch, Mutex};

use crate::error::UpdateFailed;
use crate::ingest::types::ArticleRecord;

/// Something that can produce a fresh record on demand.
#[async_trait::async_trait]
pub trait Poller: Send + Sync {
    async fn poll(&self) -> Result<ArticleRecord, UpdateFailed>;
    fn name(&self) -> &'static str;
}

/// Read-only view over coordinator state.
pub trait DataSource: Send + Sync {
    fn snapshot(&self) -> CoordinatorState;
    fn subscribe(&self) -> watch::Receiver<CoordinatorState>;
}

#[derive(Debug, Clone)]
pub struct CoordinatorState {
    pub data: Option<Arc<ArticleRecord>>,
    pub last_update_success: bool,
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub next_refresh: Option<DateTime<Utc>>,
    pub update_interval: Duration,
}

impl CoordinatorState {
    fn initial(update_interval: Duration) -> Self {
        Self {
            data: None,
            last_update_success: true,
            last_error: None,
            last_updated: None,
            next_refresh: None,
            update_interval,
        }
    }
}

pub struct Coordinator {
    poller: Arc<dyn Poller>,
    tx: watch::Sender<CoordinatorState>,
    // serializes timer ticks and on-demand refreshes
    refresh_lock: Mutex<()>,
}

impl Coordinator {
    pub fn new(poller: Arc<dyn Poller>, update_interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(CoordinatorState::initial(update_interval));
        Self {
            poller,
            tx,
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.poller.name()
    }

    /// Run one poll and publish the outcome. A success replaces the record
    /// wholesale; a failure keeps the old record but flags the update.
    pub async fn refresh(&self) -> Result<(), UpdateFailed> {
        let _guard = self.refresh_lock.lock().await;
        crate::ingest::ensure_metrics_described();
        counter!("wiki_refresh_total").increment(1);

        let outcome = self.poller.poll().await;
        let was_ok = self.tx.borrow().last_update_success;

        match outcome {
            Ok(record) => {
                if !was_ok {
                    tracing::info!(target: "coordinator", name = self.name(), "fetching data recovered");
                }
                let now = Utc::now();
                self.tx.send_modify(|st| {
                    st.data = Some(Arc::new(record));
                    st.last_update_success = true;
                    st.last_error = None;
                    st.last_updated = Some(now);
                });
                Ok(())
            }
            Err(e) => {
                if was_ok {
                    tracing::error!(target: "coordinator", name = self.name(), error = %e, "update failed");
                } else {
                    tracing::debug!(target: "coordinator", name = self.name(), error = %e, "update still failing");
                }
                let msg = e.to_string();
                self.tx.send_modify(|st| {
                    st.last_update_success = false;
                    st.last_error = Some(msg);
                });
                Err(e)
            }
        }
    }

    /// Eager refresh at setup; the caller decides what a failure means.
    pub async fn first_refresh(&self) -> Result<(), UpdateFailed> {
        self.refresh().await
    }

    pub(crate) fn set_next_refresh(&self, at: Option<DateTime<Utc>>) {
        self.tx.send_modify(|st| st.next_refresh = at);
    }
}

impl DataSource for Coordinator {
    fn snapshot(&self) -> CoordinatorState {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.tx.subscribe()
    }
}
