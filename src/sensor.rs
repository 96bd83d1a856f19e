// src/sensor.rs
//! Read-only projection of coordinator state into a scalar plus attributes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::coordinator::{CoordinatorState, DataSource};
use crate::ingest::types::ArticleRecord;

pub const SENSOR_NAME: &str = "Wikipedia Ngẫu Nhiên";
pub const SENSOR_UNIQUE_ID: &str = "wikipedia_ngau_nhien";
pub const STATE_UNAVAILABLE: &str = "unavailable";

#[derive(Clone)]
pub struct WikipediaSensor {
    rx: watch::Receiver<CoordinatorState>,
}

/// What the host sees when it asks for the entity.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SensorView {
    pub entity_id: String,
    pub name: &'static str,
    pub unique_id: &'static str,
    pub state: String,
    pub available: bool,
    pub attributes: Option<ArticleRecord>,
    pub last_updated: Option<DateTime<Utc>>,
    pub next_refresh: Option<DateTime<Utc>>,
}

impl WikipediaSensor {
    pub fn new(source: &dyn DataSource) -> Self {
        Self {
            rx: source.subscribe(),
        }
    }

    pub fn name(&self) -> &'static str {
        SENSOR_NAME
    }

    pub fn unique_id(&self) -> &'static str {
        SENSOR_UNIQUE_ID
    }

    pub fn entity_id(&self) -> String {
        format!("sensor.{SENSOR_UNIQUE_ID}")
    }

    pub fn available(&self) -> bool {
        self.rx.borrow().last_update_success
    }

    /// Summary length in characters; 0 until the first article lands.
    pub fn native_value(&self) -> usize {
        self.rx
            .borrow()
            .data
            .as_ref()
            .map(|r| r.summary.chars().count())
            .unwrap_or(0)
    }

    pub fn extra_state_attributes(&self) -> Option<ArticleRecord> {
        self.rx.borrow().data.as_deref().cloned()
    }

    pub fn render(&self) -> SensorView {
        let st = self.rx.borrow();
        let available = st.last_update_success;
        let state = if available {
            st.data
                .as_ref()
                .map(|r| r.summary.chars().count())
                .unwrap_or(0)
                .to_string()
        } else {
            STATE_UNAVAILABLE.to_string()
        };
        SensorView {
            entity_id: self.entity_id(),
            name: SENSOR_NAME,
            unique_id: SENSOR_UNIQUE_ID,
            state,
            available,
            attributes: st.data.as_deref().cloned(),
            last_updated: st.last_updated,
            next_refresh: st.next_refresh,
        }
    }

    /// Wait until the coordinator publishes a change. `false` once the
    /// coordinator is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
