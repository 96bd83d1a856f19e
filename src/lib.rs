// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod ingest;
pub mod integration;
pub mod metrics;
pub mod sensor;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::coordinator::{Coordinator, CoordinatorState, DataSource, Poller};
pub use crate::error::{FetchError, UpdateFailed};
pub use crate::ingest::types::ArticleRecord;
pub use crate::integration::Integration;
pub use crate::sensor::{SensorView, WikipediaSensor};

use axum::Router;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Full HTTP surface for a running integration, with `/metrics` when a
/// recorder was installed.
pub fn app(integration: &Integration, metrics: Option<&crate::metrics::Metrics>) -> Router {
    let state = api::AppState {
        sensor: integration.sensor(),
        coordinator: integration.coordinator(),
    };
    let router = api::router(state);
    match metrics {
        Some(m) => router.merge(m.router()),
        None => router,
    }
}

/// Install the global tracing subscriber. `LOG_FORMAT=json` switches to JSON
/// lines; `RUST_LOG` overrides the default filter. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wikipedia_sensor=info,ingest=info,coordinator=info,sensor=info,api=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
