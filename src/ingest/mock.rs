// src/ingest/mock.rs
// Test helpers: a scripted upstream and a sleeper that records instead of waiting.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::ingest::types::{RawResponse, Sleeper, SummarySource};

/// Scripted step: a response or a transport failure.
#[derive(Debug, Clone)]
pub enum Step {
    Respond(RawResponse),
    Fail(String),
}

/// Replays steps in order; once the script runs out the last step repeats.
pub struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: Mutex<u32>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            calls: Mutex::new(0),
        }
    }

    pub fn responses(responses: Vec<RawResponse>) -> Self {
        Self::new(responses.into_iter().map(Step::Respond).collect())
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl SummarySource for ScriptedSource {
    async fn fetch_random(&self) -> FetchResult<RawResponse> {
        *self.calls.lock().unwrap() += 1;
        let next = self.steps.lock().unwrap().pop_front();
        let step = match next {
            Some(s) => {
                *self.last.lock().unwrap() = Some(s.clone());
                s
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Step::Fail("script is empty".into())),
        };
        match step {
            Step::Respond(r) => Ok(r),
            Step::Fail(msg) => Err(FetchError::Transport(msg)),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// JSON body shaped like the REST summary endpoint.
pub fn summary_json(title: &str, extract: &str, image: Option<&str>) -> String {
    let mut v = serde_json::json!({
        "type": "standard",
        "title": title,
        "extract": extract,
    });
    if let Some(src) = image {
        v["originalimage"] = serde_json::json!({ "source": src, "width": 640, "height": 480 });
    }
    v.to_string()
}

pub struct RecordingSleeper {
    pub waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self {
            waits: Mutex::new(vec![]),
        }
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Default for RecordingSleeper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, d: Duration) {
        self.waits.lock().unwrap().push(d);
    }
}
