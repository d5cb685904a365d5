// src/ingest/scheduler.rs
// Drives the pipeline: a high-frequency poll sweep over due sources and a
// low-frequency retention sweep. Sources are independent; one failing feed is
// logged, its last-fetch timestamp still advances, and the sweep moves on.

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::fetch::FeedFetcher;
use crate::ingest;
use crate::model::{Source, SourceId};
use crate::registry::SourceRegistry;
use crate::store::CautionStore;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerCfg {
    /// Cadence of the due-source sweep. Finer-grained than any source interval.
    pub poll_sweep: Duration,
    /// Cadence of the retention sweep.
    pub retention_sweep: Duration,
    /// Items older than this many days are purged.
    pub retention_days: i64,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            poll_sweep: Duration::from_secs(120),
            retention_sweep: Duration::from_secs(24 * 3600),
            retention_days: 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SweepStatus {
    Ingested,
    Failed,
    /// Skipped: a previous sweep's poll of this source is still running.
    InFlight,
}

/// Per-source result of one sweep; the admin force-poll endpoint returns
/// these verbatim.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOutcome {
    pub source: String,
    pub url: String,
    pub status: SweepStatus,
    pub new_count: usize,
    pub skipped: usize,
    pub entry_errors: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct SweepSummary {
    pub sources: Vec<SourceOutcome>,
}

impl SweepSummary {
    pub fn failures(&self) -> usize {
        self.sources
            .iter()
            .filter(|o| o.status == SweepStatus::Failed)
            .count()
    }

    pub fn new_items(&self) -> usize {
        self.sources.iter().map(|o| o.new_count).sum()
    }
}

/// Owns the in-flight guard and the two sweep loops. Constructed fresh per
/// test; no ambient global state.
pub struct Scheduler {
    registry: Arc<SourceRegistry>,
    store: Arc<CautionStore>,
    fetcher: Arc<dyn FeedFetcher>,
    in_flight: Mutex<HashSet<SourceId>>,
    cfg: SchedulerCfg,
}

impl Scheduler {
    pub fn new(
        registry: Arc<SourceRegistry>,
        store: Arc<CautionStore>,
        fetcher: Arc<dyn FeedFetcher>,
        cfg: SchedulerCfg,
    ) -> Self {
        Self {
            registry,
            store,
            fetcher,
            in_flight: Mutex::new(HashSet::new()),
            cfg,
        }
    }

    /// One pass over the due sources. Takes an explicit `now` so tests can
    /// drive time without real timers.
    pub async fn poll_sweep_once(&self, now: DateTime<Utc>) -> SweepSummary {
        let due = self.registry.list_due(now);
        let mut summary = SweepSummary::default();
        for source in due {
            summary.sources.push(self.poll_source(&source, now).await);
        }
        gauge!("caution_last_sweep_ts").set(now.timestamp() as f64);
        tracing::info!(
            target: "caution_sweep",
            sources = summary.sources.len(),
            new_items = summary.new_items(),
            failures = summary.failures(),
            "poll sweep done"
        );
        summary
    }

    async fn poll_source(&self, source: &Source, now: DateTime<Utc>) -> SourceOutcome {
        let mut outcome = SourceOutcome {
            source: source.name.clone(),
            url: source.url.clone(),
            status: SweepStatus::InFlight,
            new_count: 0,
            skipped: 0,
            entry_errors: 0,
            error: None,
        };

        {
            let mut guard = self.in_flight.lock().expect("in-flight mutex poisoned");
            if !guard.insert(source.id) {
                tracing::debug!(source = %source.name, "skipping, poll still in flight");
                return outcome;
            }
        }

        let fetched = self.fetcher.fetch(source).await;

        // Advance even on failure so a dead source waits out its interval
        // instead of being retried every tick.
        self.registry.mark_fetched(source.id, now);

        match fetched {
            Ok(entries) => {
                let report = ingest::ingest(&self.store, source, entries, now);
                for err in &report.errors {
                    tracing::warn!(source = %source.name, error = %err, "entry persist failed");
                }
                outcome.status = SweepStatus::Ingested;
                outcome.new_count = report.new_count;
                outcome.skipped = report.skipped;
                outcome.entry_errors = report.errors.len();
            }
            Err(e) => {
                tracing::warn!(source = %source.name, error = %e, "source poll failed");
                counter!("caution_source_errors_total").increment(1);
                outcome.status = SweepStatus::Failed;
                outcome.error = Some(e.to_string());
            }
        }

        self.in_flight
            .lock()
            .expect("in-flight mutex poisoned")
            .remove(&source.id);
        outcome
    }

    /// Purge items past the retention horizon. Returns the deleted count.
    pub fn retention_sweep_once(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - chrono::Duration::days(self.cfg.retention_days);
        let deleted = self.store.purge_older_than(cutoff);
        counter!("caution_retention_deleted_total").increment(deleted as u64);
        tracing::info!(
            target: "caution_sweep",
            deleted,
            horizon_days = self.cfg.retention_days,
            "retention sweep done"
        );
        deleted
    }

    /// Start both background loops. Aborting the handles abandons any
    /// in-flight fetch, which is safe: ingestion is per-entry idempotent, so
    /// a partial batch is simply resumed next cycle.
    pub fn spawn(self: &Arc<Self>) -> (JoinHandle<()>, JoinHandle<()>) {
        let poll = {
            let sched = Arc::clone(self);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(sched.cfg.poll_sweep);
                loop {
                    ticker.tick().await;
                    sched.poll_sweep_once(Utc::now()).await;
                }
            })
        };
        let retention = {
            let sched = Arc::clone(self);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(sched.cfg.retention_sweep);
                loop {
                    ticker.tick().await;
                    sched.retention_sweep_once(Utc::now());
                }
            })
        };
        (poll, retention)
    }
}
