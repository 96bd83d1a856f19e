// src/ingest/providers/wikipedia.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;

use crate::error::FetchResult;
use crate::ingest::types::{RawResponse, SummarySource};

pub const SUMMARY_PATH: &str = "/api/rest_v1/page/random/summary";

/// Explicit client settings; nothing here is process-global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme + host, e.g. `https://vi.wikipedia.org`.
    pub api_base: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), SUMMARY_PATH)
    }
}

pub struct WikipediaProvider {
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http {
        endpoint: String,
        client: reqwest::Client,
    },
}

impl WikipediaProvider {
    /// Always answers 200 with the given body. Handy for offline runs.
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_config(cfg: &ClientConfig) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.timeout)
            .build()?;
        Ok(Self {
            mode: Mode::Http {
                endpoint: cfg.endpoint(),
                client,
            },
        })
    }

    pub fn endpoint(&self) -> Option<&str> {
        match &self.mode {
            Mode::Http { endpoint, .. } => Some(endpoint),
            Mode::Fixture(_) => None,
        }
    }
}

#[async_trait]
impl SummarySource for WikipediaProvider {
    async fn fetch_random(&self) -> FetchResult<RawResponse> {
        match &self.mode {
            Mode::Fixture(s) => Ok(RawResponse::ok(s.clone())),

            Mode::Http { endpoint, client } => {
                let resp = match client.get(endpoint.as_str()).send().await {
                    Ok(resp) => resp,
                    Err(e) => {
                        tracing::warn!(target: "ingest", error = ?e, provider = "Wikipedia", "provider http error");
                        counter!("wiki_provider_errors_total").increment(1);
                        return Err(e.into());
                    }
                };
                let status = resp.status().as_u16();
                if status != 200 {
                    return Ok(RawResponse::status(status));
                }
                let body = resp.text().await?;
                Ok(RawResponse { status, body })
            }
        }
    }

    fn name(&self) -> &'static str {
        "Wikipedia"
    }
}
