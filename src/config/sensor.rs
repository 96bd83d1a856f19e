// src/config/sensor.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::ingest::providers::wikipedia::ClientConfig;
use crate::ingest::RetryPolicy;

pub const ENV_CONFIG_PATH: &str = "WIKI_SENSOR_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/wikipedia_sensor.toml";

/// Upper bounds accepted by validation. Larger values overflow timer math.
pub const MAX_SCAN_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;
pub const MAX_RETRY_UNIT_MS: u64 = 60_000;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

fn default_language() -> String {
    "vi".to_string()
}
fn default_user_agent() -> String {
    "HomeAssistant-Wikipedia-Sensor".to_string()
}
fn default_scan_interval_secs() -> u64 {
    300
}
fn default_retry_unit_ms() -> u64 {
    1000
}
fn default_max_attempts() -> u32 {
    50
}
fn default_request_timeout_secs() -> u64 {
    10
}
fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorConfig {
    /// Wiki language subdomain, e.g. "vi" → vi.wikipedia.org
    #[serde(default = "default_language")]
    pub language: String,
    /// Override for the REST host (tests, mirrors). Article links still use the language wiki.
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_retry_unit_ms")]
    pub retry_unit_ms: u64,
    /// Requests per refresh cycle; 0 keeps retrying until something passes.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Serve this summary body instead of calling the network.
    #[serde(default)]
    pub fixture_path: Option<PathBuf>,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            api_base: None,
            user_agent: default_user_agent(),
            scan_interval_secs: default_scan_interval_secs(),
            retry_unit_ms: default_retry_unit_ms(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
            bind_addr: default_bind_addr(),
            fixture_path: None,
        }
    }
}

impl SensorConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading sensor config from {}", path.display()))?;
        let cfg: SensorConfig = toml::from_str(&data)
            .with_context(|| format!("parsing sensor config {}", path.display()))?;
        cfg.validated()
    }

    /// $WIKI_SENSOR_CONFIG_PATH, then config/wikipedia_sensor.toml, then
    /// defaults; env overrides applied last.
    pub fn load_default() -> Result<Self> {
        let base = if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path");
            }
            Self::load_from_file(&pb)?
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load_from_file(DEFAULT_CONFIG_PATH)?
        } else {
            Self::default()
        };
        base.with_env_overrides()?.validated()
    }

    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(v) = env_str("WIKI_LANGUAGE") {
            self.language = v;
        }
        if let Some(v) = env_str("WIKI_API_BASE") {
            self.api_base = Some(v);
        }
        if let Some(v) = env_str("WIKI_USER_AGENT") {
            self.user_agent = v;
        }
        if let Some(v) = env_parse("WIKI_SCAN_INTERVAL_SECS")? {
            self.scan_interval_secs = v;
        }
        if let Some(v) = env_parse("WIKI_RETRY_UNIT_MS")? {
            self.retry_unit_ms = v;
        }
        if let Some(v) = env_parse("WIKI_MAX_ATTEMPTS")? {
            self.max_attempts = v;
        }
        if let Some(v) = env_parse("WIKI_REQUEST_TIMEOUT_SECS")? {
            self.request_timeout_secs = v;
        }
        if let Some(v) = env_str("WIKI_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = env_str("WIKI_FIXTURE_PATH") {
            self.fixture_path = Some(PathBuf::from(v));
        }
        Ok(self)
    }

    fn validated(mut self) -> Result<Self> {
        self.language = self.language.trim().to_ascii_lowercase();
        if self.language.is_empty() {
            bail!("language must not be empty");
        }
        if !(1..=MAX_SCAN_INTERVAL_SECS).contains(&self.scan_interval_secs) {
            bail!("scan_interval_secs must be in 1..={MAX_SCAN_INTERVAL_SECS}");
        }
        if self.retry_unit_ms > MAX_RETRY_UNIT_MS {
            bail!("retry_unit_ms must be <= {MAX_RETRY_UNIT_MS}");
        }
        if !(1..=MAX_REQUEST_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            bail!("request_timeout_secs must be in 1..={MAX_REQUEST_TIMEOUT_SECS}");
        }
        self.bind_addr()?;
        Ok(self)
    }

    /// `https://<lang>.wikipedia.org`, used for article links.
    pub fn wiki_base(&self) -> String {
        format!("https://{}.wikipedia.org", self.language)
    }

    pub fn client(&self) -> ClientConfig {
        ClientConfig {
            api_base: self.api_base.clone().unwrap_or_else(|| self.wiki_base()),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            unit: Duration::from_millis(self.retry_unit_ms),
            max_attempts: self.max_attempts,
        }
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind_addr
            .parse()
            .map_err(|e| anyhow!("invalid bind_addr {:?}: {e}", self.bind_addr))
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env_str(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("invalid {key}={raw:?}: {e}")),
    }
}
