// src/integration.rs
//! Setup/unload lifecycle: wires provider → fetcher → coordinator → sensor
//! and owns the refresh scheduler.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SensorConfig;
use crate::coordinator::{Coordinator, Poller};
use crate::ingest::denylist::Denylist;
use crate::ingest::providers::wikipedia::WikipediaProvider;
use crate::ingest::scheduler::{spawn_refresh_scheduler, SchedulerCfg};
use crate::ingest::types::SummarySource;
use crate::ingest::ArticleFetcher;
use crate::sensor::WikipediaSensor;

pub const DOMAIN: &str = "wikipedia_sensor";

pub struct Integration {
    coordinator: Arc<Coordinator>,
    sensor: WikipediaSensor,
    scheduler: Option<JoinHandle<()>>,
}

impl Integration {
    /// Build everything from config and start polling.
    pub async fn setup(cfg: &SensorConfig, denylist: Denylist) -> anyhow::Result<Self> {
        let source: Arc<dyn SummarySource> = match &cfg.fixture_path {
            Some(p) => {
                let body = std::fs::read_to_string(p)
                    .with_context(|| format!("reading summary fixture {}", p.display()))?;
                info!(target: "coordinator", path = %p.display(), "serving summaries from fixture");
                Arc::new(WikipediaProvider::from_fixture_str(&body))
            }
            None => Arc::new(
                WikipediaProvider::from_config(&cfg.client())
                    .context("building Wikipedia HTTP client")?,
            ),
        };

        info!(
            target: "coordinator",
            language = %cfg.language,
            denylist = denylist.words().len(),
            max_attempts = cfg.max_attempts,
            "setting up {DOMAIN}"
        );

        let fetcher = ArticleFetcher::new(
            source,
            Arc::new(denylist),
            cfg.retry_policy(),
            cfg.wiki_base(),
        );
        Ok(Self::start(Arc::new(fetcher), cfg.scan_interval()).await)
    }

    /// Eager first refresh, then periodic refreshes every `interval`.
    /// A failed first refresh leaves the sensor unavailable until the next tick.
    pub async fn start(poller: Arc<dyn Poller>, interval: Duration) -> Self {
        let coordinator = Arc::new(Coordinator::new(poller, interval));
        if let Err(e) = coordinator.first_refresh().await {
            warn!(target: "coordinator", error = %e, "first refresh failed; sensor unavailable until next scheduled refresh");
        }

        let sensor = WikipediaSensor::new(coordinator.as_ref());
        let scheduler = spawn_refresh_scheduler(coordinator.clone(), SchedulerCfg { interval });

        Self {
            coordinator,
            sensor,
            scheduler: Some(scheduler),
        }
    }

    pub fn coordinator(&self) -> Arc<Coordinator> {
        self.coordinator.clone()
    }

    pub fn sensor(&self) -> WikipediaSensor {
        self.sensor.clone()
    }

    /// Stop polling. Returns `false` if the scheduler was already gone.
    pub async fn unload(mut self) -> bool {
        match self.scheduler.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                let _ = handle.await;
                info!(target: "coordinator", "{DOMAIN} unloaded");
                was_running
            }
            None => false,
        }
    }
}

impl Drop for Integration {
    fn drop(&mut self) {
        if let Some(handle) = self.scheduler.take() {
            handle.abort();
        }
    }
}
