// src/error.rs
// Typed failure taxonomy for the ingestion pipeline.
//
// Per-source failures (unreachable/malformed) are recovered at the sweep
// boundary; per-entry persist failures are recovered inside a batch. Neither
// ever reaches the read path.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Network failure or timeout while pulling a feed.
    #[error("source unreachable: {url}: {reason}")]
    SourceUnreachable { url: String, reason: String },

    /// Feed document retrieved but not parseable.
    #[error("source malformed: {url}: {reason}")]
    SourceMalformed { url: String, reason: String },

    /// One entry of a batch could not be persisted; the batch continues.
    #[error("persist failed for entry {link:?}: {reason}")]
    ItemPersist { link: String, reason: String },

    /// The backing store cannot be reached at all. Sweep-fatal.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Retention purge failed; retried on the next retention tick.
    #[error("retention sweep failed: {0}")]
    RetentionSweep(String),

    /// Bad seed/source configuration. Startup-fatal only.
    #[error("invalid source config: {0}")]
    InvalidConfig(String),
}

pub type FeedResult<T> = std::result::Result<T, FeedError>;
