// src/ingest/types.rs
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FetchResult;

pub const NO_IMAGE: &str = "No image available";

/// One accepted article. Serialized with the attribute keys dashboards expect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleRecord {
    pub title: String,
    #[serde(rename = "picture")]
    pub picture_url: String,
    pub url: String,
    #[serde(rename = "summary_post")]
    pub summary: String,
}

/// Status + body as received from the summary endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
        }
    }
}

/// Subset of the REST `page/random/summary` payload we care about.
#[derive(Debug, Deserialize)]
pub(crate) struct RawSummary {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub extract: Option<String>,
    #[serde(default)]
    pub originalimage: Option<RawImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImage {
    #[serde(default)]
    pub source: Option<String>,
}

/// Why an attempt was discarded and retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    NotFound,
    Status(u16),
    Blocked,
}

impl RetryReason {
    /// Backoff length in retry units.
    pub fn units(self) -> u32 {
        match self {
            RetryReason::NotFound => 1,
            RetryReason::Status(_) => 5,
            RetryReason::Blocked => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RetryReason::NotFound => "not_found",
            RetryReason::Status(_) => "http_status",
            RetryReason::Blocked => "blocked",
        }
    }
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryReason::NotFound => write!(f, "HTTP 404"),
            RetryReason::Status(code) => write!(f, "HTTP {code}"),
            RetryReason::Blocked => write!(f, "blocked article"),
        }
    }
}

#[async_trait::async_trait]
pub trait SummarySource: Send + Sync {
    /// One request against the random-summary endpoint.
    async fn fetch_random(&self) -> FetchResult<RawResponse>;
    fn name(&self) -> &'static str;
}

/// Cooperative wait between attempts.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, d: Duration);
}

pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, d: Duration) {
        tokio::time::sleep(d).await;
    }
}
