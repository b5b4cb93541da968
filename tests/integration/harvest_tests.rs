//! Integration tests for the harvester
//!
//! These tests drive full sessions against a simulated infinite-scroll feed
//! and a real SQLite database on disk.

use async_trait::async_trait;
use listing_harvester::config::{load_config_with_env, Config, HarvestConfig, TargetConfig};
use listing_harvester::driver::{DriverError, DriverResult, PageDriver};
use listing_harvester::extract::PageScripts;
use listing_harvester::harvester::{harvest, HarvestSession, SoftSignal, StopReason};
use listing_harvester::output::{render_summary, session_status, session_totals};
use listing_harvester::storage::{
    ListingRepository, SessionLog, SessionStatus, SqliteStore, Store,
};
use listing_harvester::HarvestError;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::{NamedTempFile, TempDir};

const TARGET_URL: &str = "https://www.example.com/marketplace/manila/vehicles";

struct Feed {
    total: usize,
    loaded: usize,
    per_scroll: usize,
    /// Render only the last `window` loaded cards, like a virtualized list
    window: Option<usize>,
    offset: i64,
    evaluations: usize,
    fail_at_evaluation: Option<usize>,
}

/// An infinite-scroll listing feed
///
/// Each card's href carries a tracking query that changes on every render, and
/// every render includes one sponsored card without a usable link.
struct SimulatedFeed {
    scripts: PageScripts,
    feed: Mutex<Feed>,
}

impl SimulatedFeed {
    fn new(total: usize, per_scroll: usize) -> Self {
        Self {
            scripts: PageScripts::for_target(&target()),
            feed: Mutex::new(Feed {
                total,
                loaded: per_scroll.min(total),
                per_scroll,
                window: None,
                offset: 0,
                evaluations: 0,
                fail_at_evaluation: None,
            }),
        }
    }

    fn virtualized(self, window: usize) -> Self {
        self.feed.lock().unwrap().window = Some(window);
        self
    }

    fn failing_at_evaluation(self, n: usize) -> Self {
        self.feed.lock().unwrap().fail_at_evaluation = Some(n);
        self
    }

    fn rendered(feed: &Feed) -> std::ops::Range<usize> {
        let start = match feed.window {
            Some(window) => feed.loaded.saturating_sub(window),
            None => 0,
        };
        start..feed.loaded
    }
}

fn card(index: usize, render: usize) -> Value {
    json!({
        "href": format!(
            "https://www.example.com/marketplace/item/{}/?ref=browse_tab&tracking={}",
            50_000 + index,
            render
        ),
        "text": format!(
            "₱{},000\n{} Honda City 1.5 VX\nMakati, Metro Manila\n{}K km",
            400 + index,
            2010 + index % 14,
            10 + index
        ),
    })
}

fn sponsored() -> Value {
    json!({ "href": "", "text": "Sponsored\nFind your next car" })
}

#[async_trait]
impl PageDriver for SimulatedFeed {
    async fn navigate(&self, url: &str) -> DriverResult<()> {
        if url != TARGET_URL {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                message: "unexpected url".to_string(),
            });
        }
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> DriverResult<Value> {
        let mut feed = self.feed.lock().unwrap();
        feed.evaluations += 1;
        if feed.fail_at_evaluation == Some(feed.evaluations) {
            return Err(DriverError::Evaluation("Execution context was destroyed".to_string()));
        }

        let rendered = Self::rendered(&feed);
        if script == self.scripts.probe {
            Ok(json!({
                "itemCount": rendered.len(),
                "scrollOffset": feed.offset,
                "viewportHeight": 800,
            }))
        } else if script == self.scripts.extract {
            let render = feed.evaluations;
            let mut cards: Vec<Value> = rendered.map(|i| card(i, render)).collect();
            cards.insert(cards.len() / 2, sponsored());
            Ok(Value::Array(cards))
        } else {
            Err(DriverError::Evaluation("unknown script".to_string()))
        }
    }

    async fn scroll_by(&self, delta: i64) -> DriverResult<()> {
        let mut feed = self.feed.lock().unwrap();
        if feed.loaded < feed.total {
            feed.loaded = (feed.loaded + feed.per_scroll).min(feed.total);
            feed.offset += delta;
        }
        Ok(())
    }
}

fn target() -> TargetConfig {
    TargetConfig {
        url: TARGET_URL.to_string(),
        ..Default::default()
    }
}

fn open_store(dir: &TempDir) -> Arc<SqliteStore> {
    Arc::new(SqliteStore::new(&dir.path().join("listings.db")).expect("Failed to open store"))
}

#[tokio::test(start_paused = true)]
async fn test_full_session_stores_every_listing_once() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let feed = Arc::new(SimulatedFeed::new(150, 15));

    let outcome = HarvestSession::new(feed, store.clone(), HarvestConfig::default(), target())
        .run()
        .await;

    assert!(outcome.is_success(), "harvest failed: {:?}", outcome.error);
    assert_eq!(outcome.session.discovered, 150);
    assert_eq!(outcome.inserted, 150);
    assert_eq!(store.count_listings().unwrap(), 150);

    match &outcome.session.stop_reason {
        Some(StopReason::Exhausted { signals }) => assert!(signals.len() >= 2),
        other => panic!("expected exhaustion, got {:?}", other),
    }

    // Tracking queries were stripped, so every stored link is unique and canonical.
    let listings = store.list_listings(500).unwrap();
    let links: HashSet<&str> = listings.iter().map(|r| r.listing.link.as_str()).collect();
    assert_eq!(links.len(), 150);
    assert!(links.iter().all(|l| !l.contains('?')));
}

#[tokio::test(start_paused = true)]
async fn test_stored_fields_are_classified() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let feed = Arc::new(SimulatedFeed::new(15, 15));

    HarvestSession::new(feed, store.clone(), HarvestConfig::default(), target())
        .run()
        .await;

    let existing = store
        .find_existing(&["https://www.example.com/marketplace/item/50003/".to_string()])
        .unwrap();
    assert_eq!(existing.len(), 1);

    let record = store
        .list_listings(100)
        .unwrap()
        .into_iter()
        .find(|r| r.listing.link.ends_with("/50003/"))
        .unwrap();
    assert_eq!(record.listing.title, "2013 Honda City 1.5 VX");
    assert_eq!(record.listing.year.as_deref(), Some("2013"));
    assert_eq!(record.listing.price, "₱403,000");
    assert_eq!(record.listing.currency.as_deref(), Some("PHP"));
    assert_eq!(record.listing.location, "Makati, Metro Manila");
    assert_eq!(record.listing.mileage, "13K km");
}

#[tokio::test(start_paused = true)]
async fn test_virtualized_feed_is_not_cut_short() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    // The rendered count never changes, so one soft signal is always tripped
    // while the feed is still loading.
    let feed = Arc::new(SimulatedFeed::new(200, 10).virtualized(30));

    let outcome = HarvestSession::new(feed, store.clone(), HarvestConfig::default(), target())
        .run()
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.inserted, 200);
    match &outcome.session.stop_reason {
        Some(StopReason::Exhausted { signals }) => {
            assert!(signals.contains(&SoftSignal::NoNewItems));
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_second_session_finds_everything_stored() {
    let dir = TempDir::new().unwrap();

    let first = HarvestSession::new(
        Arc::new(SimulatedFeed::new(60, 20)),
        open_store(&dir),
        HarvestConfig::default(),
        target(),
    )
    .run()
    .await;
    assert_eq!(first.inserted, 60);

    // A fresh store handle on the same file, as a later process would have.
    let store = open_store(&dir);
    let second = HarvestSession::new(
        Arc::new(SimulatedFeed::new(75, 20)),
        store.clone(),
        HarvestConfig::default(),
        target(),
    )
    .run()
    .await;

    assert_eq!(second.session.discovered, 75);
    assert_eq!(second.inserted, 15);
    assert_eq!(second.ingest.already_stored, 60);
    assert_eq!(store.count_listings().unwrap(), 75);
}

#[tokio::test(start_paused = true)]
async fn test_fatal_driver_error_keeps_persisted_rows() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    // Three evaluations per cycle: the 10th is the first probe of cycle four.
    let feed = Arc::new(SimulatedFeed::new(500, 10).failing_at_evaluation(10));

    let outcome = HarvestSession::new(feed, store.clone(), HarvestConfig::default(), target())
        .run()
        .await;

    assert!(matches!(
        outcome.error,
        Some(HarvestError::Driver(DriverError::Evaluation(_)))
    ));
    assert_eq!(outcome.session.cycles, 3);
    assert_eq!(outcome.inserted, 40);
    assert_eq!(store.count_listings().unwrap(), 40);
}

#[tokio::test(start_paused = true)]
async fn test_session_row_records_outcome() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let session_id = store.begin_session("0123abcd").unwrap();

    let config = HarvestConfig {
        max_cycles: 4,
        ..Default::default()
    };
    let outcome = HarvestSession::new(
        Arc::new(SimulatedFeed::new(1000, 25)),
        store.clone(),
        config,
        target(),
    )
    .run()
    .await;

    store
        .finish_session(
            session_id,
            session_status(&outcome),
            &session_totals(&outcome),
            None,
        )
        .unwrap();

    let recorded = &store.recent_sessions(1).unwrap()[0];
    assert_eq!(recorded.status, SessionStatus::Completed);
    assert_eq!(recorded.cycles, 4);
    assert_eq!(recorded.inserted, 125);
    assert_eq!(recorded.config_hash, "0123abcd");

    let summary = render_summary(session_id, &outcome);
    assert!(summary.contains("Inserted:        125"));
    assert!(summary.contains("cycle limit reached"));
}

#[tokio::test(start_paused = true)]
async fn test_harvest_from_config_file() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("from_file.db");

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[harvest]
max-cycles = 6
initial-delay-ms = 1500
min-delay-ms = 1000
max-delay-ms = 3000
progress-log-interval = 2

[target]
url = "{}"

[output]
database-path = "{}"
"#,
        TARGET_URL,
        db_path.display()
    )
    .unwrap();

    let config: Config =
        load_config_with_env(Some(file.path()), |_| None).expect("config should load");
    assert_eq!(config.harvest.max_cycles, 6);

    let store = Arc::new(SqliteStore::new(&db_path).unwrap());
    let outcome = harvest(Arc::new(SimulatedFeed::new(1000, 10)), store.clone(), &config).await;

    assert_eq!(outcome.session.stop_reason, Some(StopReason::MaxCycles));
    assert_eq!(outcome.inserted, 70);
    assert_eq!(store.count_listings().unwrap(), 70);
}
