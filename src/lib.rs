// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod registry;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::classify::{classify, Classification};
pub use crate::error::{FeedError, FeedResult};
pub use crate::fetch::{FeedFetcher, RssFetcher};
pub use crate::ingest::scheduler::{Scheduler, SchedulerCfg, SweepStatus, SweepSummary};
pub use crate::ingest::IngestReport;
pub use crate::model::{Category, CautionItem, Persona, RawEntry, Severity, Source};
pub use crate::registry::SourceRegistry;
pub use crate::store::CautionStore;
