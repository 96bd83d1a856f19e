// tests/fetch_loop.rs
//
// Fetch-and-filter loop against a scripted upstream. Waits are recorded,
// not slept, so the backoff sequence can be asserted exactly.

use std::sync::Arc;
use std::time::Duration;

use wikipedia_sensor::error::FetchError;
use wikipedia_sensor::ingest::denylist::Denylist;
use wikipedia_sensor::ingest::mock::{summary_json, RecordingSleeper, ScriptedSource, Step};
use wikipedia_sensor::ingest::types::{RawResponse, RetryReason, NO_IMAGE};
use wikipedia_sensor::ingest::{ArticleFetcher, RetryPolicy};

const BASE: &str = "https://vi.wikipedia.org";
const UNIT: Duration = Duration::from_millis(1000);

fn fetcher(
    source: Arc<ScriptedSource>,
    words: &[&str],
    max_attempts: u32,
) -> (ArticleFetcher, Arc<RecordingSleeper>) {
    let sleeper = Arc::new(RecordingSleeper::new());
    let f = ArticleFetcher::new(
        source,
        Arc::new(Denylist::new(words.iter().copied())),
        RetryPolicy {
            unit: UNIT,
            max_attempts,
        },
        BASE,
    )
    .with_sleeper(sleeper.clone());
    (f, sleeper)
}

#[tokio::test]
async fn mixed_failures_then_clean_article() {
    let source = Arc::new(ScriptedSource::responses(vec![
        RawResponse::status(404),
        RawResponse::status(500),
        RawResponse::ok(summary_json("Game of Thrones", "A series.", None)),
        RawResponse::ok(summary_json("Hà Nội", "Thủ đô của Việt Nam.", None)),
    ]));
    let (f, sleeper) = fetcher(source.clone(), &["game"], 0);

    let rec = f.fetch_article().await.expect("clean article");
    assert_eq!(rec.title, "Hà Nội");
    assert_eq!(rec.url, "https://vi.wikipedia.org/wiki/Hà Nội");
    assert_eq!(source.call_count(), 4);
    assert_eq!(sleeper.waits(), vec![UNIT, UNIT * 5, UNIT]);
}

#[tokio::test]
async fn blocked_words_never_escape_in_title_or_summary() {
    let source = Arc::new(ScriptedSource::responses(vec![
        RawResponse::ok(summary_json("Bóng Đá Việt Nam", "x", None)),
        RawResponse::ok(summary_json("Neutral", "Một ENZYME quan trọng", None)),
        RawResponse::ok(summary_json("Toán học", "Ngành khoa học", None)),
        RawResponse::ok(summary_json("Toán học", "Khoa học về số", Some("https://img/x.png"))),
    ]));
    let (f, sleeper) = fetcher(source, &["bóng đá", "enzyme", "ngành"], 10);

    let rec = f.fetch_article().await.unwrap();
    assert_eq!(rec.summary, "Khoa học về số");
    assert_eq!(rec.picture_url, "https://img/x.png");
    assert_eq!(sleeper.waits().len(), 3);
    assert!(sleeper.waits().iter().all(|w| *w == UNIT));
}

#[tokio::test]
async fn missing_image_gets_sentinel() {
    let source = Arc::new(ScriptedSource::responses(vec![RawResponse::ok(
        r#"{"title":"A","extract":"b","originalimage":{"source":""}}"#,
    )]));
    let (f, _) = fetcher(source, &[], 5);
    let rec = f.fetch_article().await.unwrap();
    assert_eq!(rec.picture_url, NO_IMAGE);
    assert_eq!(rec.picture_url, "No image available");
}

#[tokio::test]
async fn transport_error_fails_once_without_retry() {
    let source = Arc::new(ScriptedSource::new(vec![
        Step::Fail("connection refused".into()),
        Step::Respond(RawResponse::ok(summary_json("Later", "never reached", None))),
    ]));
    let (f, sleeper) = fetcher(source.clone(), &[], 0);

    let err = f.fetch_article().await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(ref m) if m.contains("connection refused")));
    assert_eq!(source.call_count(), 1);
    assert!(sleeper.waits().is_empty());
}

#[tokio::test]
async fn malformed_json_fails_after_earlier_retries() {
    let source = Arc::new(ScriptedSource::responses(vec![
        RawResponse::status(404),
        RawResponse::ok("{ not json"),
    ]));
    let (f, sleeper) = fetcher(source.clone(), &[], 0);

    let err = f.fetch_article().await.unwrap_err();
    assert_eq!(err.kind(), "parse");
    assert_eq!(source.call_count(), 2);
    assert_eq!(sleeper.waits(), vec![UNIT]);
}

#[tokio::test]
async fn bounded_loop_reports_exhaustion() {
    // script repeats its last step forever
    let source = Arc::new(ScriptedSource::responses(vec![RawResponse::status(503)]));
    let (f, sleeper) = fetcher(source.clone(), &[], 4);

    let err = f.fetch_article().await.unwrap_err();
    match err {
        FetchError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 4);
            assert_eq!(last, RetryReason::Status(503));
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
    assert_eq!(source.call_count(), 4);
    assert_eq!(sleeper.waits(), vec![UNIT * 5; 3]);
}

#[tokio::test]
async fn overly_broad_denylist_exhausts_instead_of_spinning() {
    let source = Arc::new(ScriptedSource::responses(vec![RawResponse::ok(summary_json(
        "Anything",
        "at all",
        None,
    ))]));
    let (f, _) = fetcher(source, &["a"], 3);

    let err = f.fetch_article().await.unwrap_err();
    assert!(matches!(
        err,
        FetchError::Exhausted {
            attempts: 3,
            last: RetryReason::Blocked
        }
    ));
}
