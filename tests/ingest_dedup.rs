// tests/ingest_dedup.rs
// Ingesting the same (source, link) twice stores exactly one item.

use std::time::Duration;

use caution_feed::error::FeedError;
use caution_feed::ingest::ingest;
use caution_feed::model::{Category, Persona, RawEntry, Severity, Source, SourceId};
use caution_feed::store::{CautionStore, QueryFilter};
use chrono::{TimeZone, Utc};

fn scam_source() -> Source {
    Source {
        id: SourceId(7),
        name: "scam-watch".into(),
        url: "https://example.com/feed".into(),
        label: "Scam Watch".into(),
        category: Category::Scams,
        personas: vec![Persona::Senior, Persona::General],
        interval: Duration::from_secs(2 * 3600),
        active: true,
        last_fetched: None,
    }
}

fn entry(link: &str, title: &str) -> RawEntry {
    RawEntry {
        title: title.to_string(),
        summary: "stay alert".to_string(),
        body: None,
        link: link.to_string(),
        published: None,
    }
}

#[test]
fn repolling_the_same_entry_creates_nothing_new() {
    let store = CautionStore::new();
    let source = scam_source();
    let now = Utc.with_ymd_and_hms(2025, 6, 3, 9, 0, 0).unwrap();

    let batch = vec![entry(
        "https://example.com/alerts/a1",
        "Urgent: new phone scam targeting seniors",
    )];

    let first = ingest(&store, &source, batch.clone(), now);
    assert_eq!(first.new_count, 1);
    assert_eq!(first.skipped, 0);
    assert!(first.errors.is_empty());

    let second = ingest(&store, &source, batch, now + chrono::Duration::hours(2));
    assert_eq!(second.new_count, 0);
    assert_eq!(second.skipped, 1);
    assert_eq!(store.len(), 1);
}

#[test]
fn ingested_item_carries_source_config_and_classification() {
    let store = CautionStore::new();
    let source = scam_source();
    let now = Utc.with_ymd_and_hms(2025, 6, 3, 9, 0, 0).unwrap();

    ingest(
        &store,
        &source,
        vec![entry(
            "https://example.com/alerts/a1",
            "Urgent: new phone scam targeting seniors",
        )],
        now,
    );

    let page = store.query(Persona::Senior, &QueryFilter::default());
    assert_eq!(page.total, 1);
    let it = &page.items[0];
    // "urgent" is a critical keyword; category/personas come from the source
    assert_eq!(it.severity, Severity::Critical);
    assert_eq!(it.category, Category::Scams);
    assert_eq!(it.personas, vec![Persona::Senior, Persona::General]);
    // No upstream pubDate: ingestion time substitutes
    assert_eq!(it.published, now);
    assert!(it.active);
}

#[test]
fn entry_without_link_is_reported_and_batch_continues() {
    let store = CautionStore::new();
    let source = scam_source();
    let now = Utc::now();

    let report = ingest(
        &store,
        &source,
        vec![
            entry("", "broken entry"),
            entry("https://example.com/alerts/a2", "Phishing wave hits inboxes"),
        ],
        now,
    );

    assert_eq!(report.new_count, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(matches!(report.errors[0], FeedError::ItemPersist { .. }));
    assert_eq!(store.len(), 1);
}

#[test]
fn later_source_config_change_does_not_retag_stored_items() {
    let store = CautionStore::new();
    let mut source = scam_source();
    let now = Utc::now();

    ingest(
        &store,
        &source,
        vec![entry("https://example.com/alerts/a1", "quiet note")],
        now,
    );

    // Re-tag the source; already-stored items keep their frozen labels.
    source.personas = vec![Persona::Teen];
    ingest(
        &store,
        &source,
        vec![entry("https://example.com/alerts/a9", "another note")],
        now,
    );

    let senior = store.query(Persona::Senior, &QueryFilter::default());
    assert_eq!(senior.total, 1);
    let teen = store.query(Persona::Teen, &QueryFilter::default());
    assert_eq!(teen.total, 1);
}
