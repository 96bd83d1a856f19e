// tests/integration_lifecycle.rs
//
// Setup → eager refresh → scheduled refreshes → unload, with short intervals.

use std::sync::Arc;
use std::time::Duration;

use wikipedia_sensor::config::SensorConfig;
use wikipedia_sensor::coordinator::DataSource;
use wikipedia_sensor::ingest::denylist::Denylist;
use wikipedia_sensor::ingest::mock::{summary_json, ScriptedSource, Step};
use wikipedia_sensor::ingest::types::RawResponse;
use wikipedia_sensor::ingest::{ArticleFetcher, RetryPolicy};
use wikipedia_sensor::Integration;

fn fetcher(source: Arc<ScriptedSource>) -> Arc<ArticleFetcher> {
    Arc::new(ArticleFetcher::new(
        source,
        Arc::new(Denylist::new(["game"])),
        RetryPolicy {
            unit: Duration::from_millis(1),
            max_attempts: 3,
        },
        "https://vi.wikipedia.org",
    ))
}

#[tokio::test]
async fn setup_refreshes_eagerly_then_on_schedule() {
    let source = Arc::new(ScriptedSource::responses(vec![RawResponse::ok(summary_json(
        "Hà Nội",
        "Hello",
        None,
    ))]));
    let integration = Integration::start(fetcher(source.clone()), Duration::from_millis(40)).await;

    // eager refresh already happened
    assert_eq!(source.call_count(), 1);
    let sensor = integration.sensor();
    assert_eq!(sensor.native_value(), 5);
    assert!(integration.coordinator().snapshot().next_refresh.is_some());

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(source.call_count() >= 3, "calls = {}", source.call_count());

    assert!(integration.unload().await);
    let after = source.call_count();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(source.call_count(), after);
}

#[tokio::test]
async fn failed_first_refresh_recovers_on_next_tick() {
    let source = Arc::new(ScriptedSource::new(vec![
        Step::Fail("upstream down".into()),
        Step::Respond(RawResponse::ok(summary_json("Toán học", "Số", None))),
    ]));
    let integration = Integration::start(fetcher(source.clone()), Duration::from_millis(30)).await;

    let mut sensor = integration.sensor();
    assert!(!sensor.available());
    assert_eq!(sensor.render().state, "unavailable");

    let recovered = tokio::time::timeout(Duration::from_secs(2), async {
        while sensor.changed().await {
            if sensor.available() && sensor.extra_state_attributes().is_some() {
                return true;
            }
        }
        false
    })
    .await
    .unwrap_or(false);
    assert!(recovered);
    assert_eq!(sensor.native_value(), 2);

    integration.unload().await;
}

#[tokio::test]
async fn setup_from_config_with_fixture_file() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("summary.json");
    std::fs::write(&p, include_str!("fixtures/random_summary.json")).unwrap();

    let cfg = SensorConfig {
        fixture_path: Some(p),
        scan_interval_secs: 3600,
        ..SensorConfig::default()
    };
    let integration = Integration::setup(&cfg, Denylist::default()).await.unwrap();

    let view = integration.sensor().render();
    let attrs = view.attributes.expect("fixture article published");
    assert_eq!(attrs.title, "Vịnh Hạ Long");
    assert_eq!(attrs.url, "https://vi.wikipedia.org/wiki/Vịnh Hạ Long");
    assert_eq!(view.state, attrs.summary.chars().count().to_string());

    assert!(integration.unload().await);
}
