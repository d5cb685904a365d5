// tests/store_query.rs
// Read-path guarantees: persona isolation, stable pagination, filters,
// stats, and the retention boundary.

use caution_feed::model::{Category, ItemId, Persona, Severity, SourceId};
use caution_feed::store::{CautionStore, InsertOutcome, NewItem, QueryFilter};
use chrono::{DateTime, TimeZone, Utc};

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn item(link: &str, personas: Vec<Persona>, published: DateTime<Utc>) -> NewItem {
    NewItem {
        source_id: SourceId(1),
        source_name: "Fixture Source".into(),
        source_url: "https://example.com/feed".into(),
        title: format!("item {link}"),
        description: "desc".into(),
        body: None,
        category: Category::GeneralSecurity,
        personas,
        severity: Severity::Low,
        tags: vec![],
        published,
        link: link.to_string(),
    }
}

#[test]
fn persona_isolation_holds_for_every_item() {
    let store = CautionStore::new();
    let t = base_time();
    store.insert_new(item("a", vec![Persona::Senior], t));
    store.insert_new(item("b", vec![Persona::Parent, Persona::Teen], t));
    store.insert_new(item("c", vec![Persona::Senior, Persona::General], t));

    let page = store.query(Persona::Senior, &QueryFilter::default());
    assert_eq!(page.total, 2);
    for it in &page.items {
        assert!(it.personas.contains(&Persona::Senior));
    }
}

#[test]
fn pagination_is_complete_and_duplicate_free_under_timestamp_ties() {
    let store = CautionStore::new();
    let t = base_time();
    // 25 items, five share each timestamp, so ordering must fall back to id
    for i in 0..25 {
        let published = t + chrono::Duration::hours(i / 5);
        store.insert_new(item(&format!("link-{i}"), vec![Persona::General], published));
    }

    let mut seen = std::collections::HashSet::new();
    let mut last: Option<(DateTime<Utc>, u64)> = None;
    let mut page_no = 1;
    loop {
        let page = store.query(
            Persona::General,
            &QueryFilter {
                page: page_no,
                limit: 7,
                ..Default::default()
            },
        );
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 4);
        if page.items.is_empty() {
            break;
        }
        for it in &page.items {
            assert!(seen.insert(it.id), "duplicate row {:?}", it.id);
            // newest first, id descending within equal timestamps
            if let Some((prev_ts, prev_id)) = last {
                assert!(
                    it.published < prev_ts || (it.published == prev_ts && it.id.0 < prev_id),
                    "ordering violated at {:?}",
                    it.id
                );
            }
            last = Some((it.published, it.id.0));
        }
        page_no += 1;
    }
    assert_eq!(seen.len(), 25);
}

#[test]
fn out_of_range_page_numbers_yield_an_empty_page() {
    let store = CautionStore::new();
    let t = base_time();
    for i in 0..3 {
        store.insert_new(item(&format!("link-{i}"), vec![Persona::General], t));
    }

    // Page numbers arrive straight off the query string; even usize::MAX
    // must produce an empty page, never an arithmetic overflow.
    let page = store.query(
        Persona::General,
        &QueryFilter {
            page: usize::MAX,
            limit: 100,
            ..Default::default()
        },
    );
    assert_eq!(page.total, 3);
    assert!(page.items.is_empty());

    let beyond = store.query(
        Persona::General,
        &QueryFilter {
            page: 2,
            limit: 10,
            ..Default::default()
        },
    );
    assert_eq!(beyond.total, 3);
    assert!(beyond.items.is_empty());
}

#[test]
fn category_severity_and_date_filters_apply() {
    let store = CautionStore::new();
    let t = base_time();

    let mut scam = item("s1", vec![Persona::General], t);
    scam.category = Category::Scams;
    scam.severity = Severity::Critical;
    store.insert_new(scam);

    let old = item("s2", vec![Persona::General], t - chrono::Duration::days(30));
    store.insert_new(old);

    let by_cat = store.query(
        Persona::General,
        &QueryFilter {
            category: Some(Category::Scams),
            ..Default::default()
        },
    );
    assert_eq!(by_cat.total, 1);

    let by_sev = store.query(
        Persona::General,
        &QueryFilter {
            severity: Some(Severity::Critical),
            ..Default::default()
        },
    );
    assert_eq!(by_sev.total, 1);

    let recent = store.query(
        Persona::General,
        &QueryFilter {
            since: Some(t - chrono::Duration::days(7)),
            ..Default::default()
        },
    );
    assert_eq!(recent.total, 1);
}

#[test]
fn deactivated_items_disappear_from_reads() {
    let store = CautionStore::new();
    let t = base_time();
    let id = match store.insert_new(item("a", vec![Persona::General], t)) {
        InsertOutcome::Inserted(id) => id,
        InsertOutcome::Duplicate => unreachable!(),
    };
    assert_eq!(store.query(Persona::General, &QueryFilter::default()).total, 1);

    assert!(store.set_active(id, false));
    assert_eq!(store.query(Persona::General, &QueryFilter::default()).total, 0);
}

#[test]
fn stats_count_by_severity_category_and_recency() {
    let store = CautionStore::new();
    let now = base_time();

    let mut a = item("a", vec![Persona::Senior], now - chrono::Duration::days(1));
    a.severity = Severity::Critical;
    a.category = Category::Scams;
    store.insert_new(a);

    let mut b = item("b", vec![Persona::Senior], now - chrono::Duration::days(20));
    b.severity = Severity::Low;
    store.insert_new(b);

    store.insert_new(item("c", vec![Persona::Parent], now));

    let stats = store.stats(Persona::Senior, now);
    assert_eq!(stats.total_active, 2);
    assert_eq!(stats.recent_count, 1);
    assert_eq!(stats.by_severity.get(&Severity::Critical), Some(&1));
    assert_eq!(stats.by_severity.get(&Severity::Low), Some(&1));
    assert_eq!(stats.by_category.get(&Category::Scams), Some(&1));
    assert_eq!(stats.by_category.get(&Category::GeneralSecurity), Some(&1));
}

#[test]
fn view_counts_increment_per_item() {
    let store = CautionStore::new();
    let id = match store.insert_new(item("a", vec![Persona::General], base_time())) {
        InsertOutcome::Inserted(id) => id,
        InsertOutcome::Duplicate => unreachable!(),
    };
    assert_eq!(store.increment_view_count(id), Some(1));
    assert_eq!(store.increment_view_count(id), Some(2));
    assert_eq!(store.increment_view_count(ItemId(999)), None);
}

#[test]
fn retention_deletes_strictly_older_than_horizon() {
    let store = CautionStore::new();
    let now = base_time();
    let horizon = chrono::Duration::days(90);

    store.insert_new(item(
        "old",
        vec![Persona::General],
        now - horizon - chrono::Duration::days(1),
    ));
    store.insert_new(item(
        "fresh",
        vec![Persona::General],
        now - horizon + chrono::Duration::days(1),
    ));

    let deleted = store.purge_older_than(now - horizon);
    assert_eq!(deleted, 1);

    let page = store.query(Persona::General, &QueryFilter::default());
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].link, "fresh");
}

#[test]
fn purged_dedup_key_can_be_reingested() {
    let store = CautionStore::new();
    let now = base_time();
    store.insert_new(item("a", vec![Persona::General], now - chrono::Duration::days(100)));
    assert_eq!(store.purge_older_than(now - chrono::Duration::days(90)), 1);

    // The link comes back upstream with a fresh timestamp: it is new again.
    let outcome = store.insert_new(item("a", vec![Persona::General], now));
    assert!(matches!(outcome, InsertOutcome::Inserted(_)));
}
