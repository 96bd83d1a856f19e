//! Wikipedia Sensor — Binary Entrypoint
//! Loads config, starts polling, and serves the sensor over HTTP until Ctrl-C.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use wikipedia_sensor::config::SensorConfig;
use wikipedia_sensor::ingest::denylist::load_denylist_default;
use wikipedia_sensor::metrics::Metrics;
use wikipedia_sensor::{app, init_tracing, Integration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = SensorConfig::load_default().context("loading sensor config")?;
    let denylist = load_denylist_default().context("loading denylist")?;
    let addr = cfg.bind_addr()?;

    let metrics = match Metrics::init(cfg.scan_interval_secs) {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = ?e, "metrics recorder not installed; /metrics disabled");
            None
        }
    };

    let integration = Integration::setup(&cfg, denylist).await?;

    // Log every re-render the way a host would pick it up.
    let mut watcher = integration.sensor();
    let render_log = tokio::spawn(async move {
        while watcher.changed().await {
            let view = watcher.render();
            info!(
                target: "sensor",
                entity_id = %view.entity_id,
                state = %view.state,
                title = view.attributes.as_ref().map(|a| a.title.as_str()).unwrap_or(""),
                "sensor updated"
            );
        }
    });

    let router = app(&integration, metrics.as_ref());
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    integration.unload().await;
    render_log.abort();
    Ok(())
}
