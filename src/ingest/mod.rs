// src/ingest/mod.rs
pub mod denylist;
pub mod mock;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::coordinator::Poller;
use crate::error::{FetchError, FetchResult, UpdateFailed};
use crate::ingest::denylist::Denylist;
use crate::ingest::types::{
    ArticleRecord, RawSummary, RetryReason, Sleeper, SummarySource, TokioSleeper, NO_IMAGE,
};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(describe_metrics);
}

fn describe_metrics() {
    describe_counter!(
        "wiki_fetch_requests_total",
        "Requests sent to the random-summary endpoint."
    );
    describe_counter!(
        "wiki_fetch_retries_total",
        "Attempts discarded and retried, by reason."
    );
    describe_counter!(
        "wiki_articles_blocked_total",
        "Articles rejected by the denylist."
    );
    describe_counter!(
        "wiki_fetch_failures_total",
        "Fetch cycles that ended in an error, by kind."
    );
    describe_counter!(
        "wiki_provider_errors_total",
        "Provider requests that failed before a response arrived."
    );
    describe_histogram!("wiki_fetch_ms", "Duration of a full fetch cycle in milliseconds.");
    describe_gauge!("wiki_last_success_ts", "Unix ts of the last accepted article.");
    describe_gauge!("wiki_summary_len", "Character length of the last accepted summary.");
    describe_counter!(
        "wiki_refresh_total",
        "Coordinator refreshes, scheduled or on demand."
    );
    describe_gauge!(
        "wiki_scheduler_last_tick_ts",
        "Unix ts of the last scheduled refresh tick."
    );
    describe_gauge!("wiki_scan_interval_secs", "Configured refresh interval in seconds.");
}

/// Backoff unit and per-cycle attempt budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub unit: Duration,
    /// Requests allowed per cycle; 0 means unbounded.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
            max_attempts: 50,
        }
    }
}

impl RetryPolicy {
    pub fn backoff(&self, reason: RetryReason) -> Duration {
        self.unit * reason.units()
    }

    fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts != 0 && attempts >= self.max_attempts
    }
}

/// Canonical article link: the raw title substituted into the wiki URL.
pub fn article_url(article_base: &str, title: &str) -> String {
    format!("{}/wiki/{}", article_base.trim_end_matches('/'), title)
}

/// Parse a 200 body into a record. Denylist checks are the caller's job.
pub fn parse_summary(body: &str, article_base: &str) -> FetchResult<ArticleRecord> {
    let raw: RawSummary = serde_json::from_str(body)?;
    let title = raw.title.unwrap_or_default();
    let summary = raw.extract.unwrap_or_default();
    let picture_url = raw
        .originalimage
        .and_then(|img| img.source)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| NO_IMAGE.to_string());
    let url = article_url(article_base, &title);
    Ok(ArticleRecord {
        title,
        picture_url,
        url,
        summary,
    })
}

/// The fetch-and-filter loop over one summary source.
pub struct ArticleFetcher {
    source: Arc<dyn SummarySource>,
    denylist: Arc<Denylist>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    article_base: String,
}

impl ArticleFetcher {
    pub fn new(
        source: Arc<dyn SummarySource>,
        denylist: Arc<Denylist>,
        policy: RetryPolicy,
        article_base: impl Into<String>,
    ) -> Self {
        Self {
            source,
            denylist,
            policy,
            sleeper: Arc::new(TokioSleeper),
            article_base: article_base.into(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Keep requesting until an article passes the denylist, a hard error
    /// occurs, or the attempt budget runs out.
    pub async fn fetch_article(&self) -> FetchResult<ArticleRecord> {
        ensure_metrics_described();
        let t0 = Instant::now();
        let res = self.run_attempts().await;
        histogram!("wiki_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        match &res {
            Ok(rec) => {
                let now = chrono::Utc::now().timestamp().max(0) as f64;
                gauge!("wiki_last_success_ts").set(now);
                gauge!("wiki_summary_len").set(rec.summary.chars().count() as f64);
            }
            Err(e) => {
                counter!("wiki_fetch_failures_total", "kind" => e.kind()).increment(1);
                tracing::debug!(target: "ingest", error = %e, source = self.source.name(), "fetch cycle failed");
            }
        }
        res
    }

    async fn run_attempts(&self) -> FetchResult<ArticleRecord> {
        let mut attempts: u32 = 0;
        loop {
            attempts += 1;
            counter!("wiki_fetch_requests_total").increment(1);

            let resp = self.source.fetch_random().await?;
            let reason = match resp.status {
                200 => {
                    let rec = parse_summary(&resp.body, &self.article_base)?;
                    match self.denylist.blocks(&rec.title, &rec.summary) {
                        None => {
                            tracing::debug!(target: "ingest", title = %rec.title, attempts, "article accepted");
                            return Ok(rec);
                        }
                        Some(word) => {
                            tracing::info!(target: "ingest", title = %rec.title, word, "skipping blocked article");
                            counter!("wiki_articles_blocked_total").increment(1);
                            RetryReason::Blocked
                        }
                    }
                }
                404 => {
                    tracing::warn!(target: "ingest", "Wikipedia API returned 404, trying again");
                    RetryReason::NotFound
                }
                code => {
                    tracing::warn!(target: "ingest", status = code, "Wikipedia API error");
                    RetryReason::Status(code)
                }
            };

            if self.policy.exhausted(attempts) {
                return Err(FetchError::Exhausted {
                    attempts,
                    last: reason,
                });
            }
            counter!("wiki_fetch_retries_total", "reason" => reason.label()).increment(1);
            self.sleeper.sleep(self.policy.backoff(reason)).await;
        }
    }
}

#[async_trait::async_trait]
impl Poller for ArticleFetcher {
    async fn poll(&self) -> Result<ArticleRecord, UpdateFailed> {
        Ok(self.fetch_article().await?)
    }

    fn name(&self) -> &'static str {
        "Wikipedia Sensor"
    }
}
