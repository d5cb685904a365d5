// src/ingest/mod.rs
// Deduplicating Ingester: turns one source's fetched batch into stored
// caution items. Idempotent under re-polls; one bad entry never blocks the
// rest of its batch.

pub mod scheduler;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

use crate::classify::classify;
use crate::error::FeedError;
use crate::model::{RawEntry, Source};
use crate::store::{CautionStore, InsertOutcome, NewItem};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("caution_entries_parsed_total", "Entries parsed from feeds.");
        describe_counter!("caution_items_new_total", "Caution items newly persisted.");
        describe_counter!(
            "caution_items_skipped_total",
            "Entries skipped as duplicates of stored items."
        );
        describe_counter!(
            "caution_entry_errors_total",
            "Entries that failed to persist."
        );
        describe_counter!(
            "caution_source_errors_total",
            "Feed fetch/parse failures, per sweep."
        );
        describe_counter!(
            "caution_retention_deleted_total",
            "Items removed by the retention sweep."
        );
        describe_gauge!(
            "caution_last_sweep_ts",
            "Unix ts of the last completed poll sweep."
        );
        describe_histogram!("caution_fetch_parse_ms", "Feed parse time in milliseconds.");
    });
}

/// Outcome of one source's batch. `errors` holds the per-entry failures that
/// were recorded and skipped; the batch itself always runs to completion.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub new_count: usize,
    pub skipped: usize,
    pub errors: Vec<FeedError>,
}

/// Persist the new entries of one batch, classified and persona-tagged from
/// the source's configuration as of this moment. Entries are processed in
/// fetched order; an existing `(source, link)` key is skipped.
pub fn ingest(
    store: &CautionStore,
    source: &Source,
    entries: Vec<RawEntry>,
    now: DateTime<Utc>,
) -> IngestReport {
    ensure_metrics_described();

    let mut report = IngestReport::default();
    for entry in entries {
        if entry.link.is_empty() {
            report.errors.push(FeedError::ItemPersist {
                link: String::new(),
                reason: format!("entry {:?} has no link", entry.title),
            });
            continue;
        }

        let classification = classify(&entry.title, &entry.summary);
        let outcome = store.insert_new(NewItem {
            source_id: source.id,
            source_name: source.label.clone(),
            source_url: source.url.clone(),
            title: entry.title,
            description: entry.summary,
            body: entry.body,
            category: source.category,
            personas: source.personas.clone(),
            severity: classification.severity,
            tags: classification.tags,
            published: entry.published.unwrap_or(now),
            link: entry.link,
        });
        match outcome {
            InsertOutcome::Inserted(_) => report.new_count += 1,
            InsertOutcome::Duplicate => report.skipped += 1,
        }
    }

    counter!("caution_items_new_total").increment(report.new_count as u64);
    counter!("caution_items_skipped_total").increment(report.skipped as u64);
    counter!("caution_entry_errors_total").increment(report.errors.len() as u64);

    report
}
