// src/registry.rs
// In-memory Source Registry behind the narrow contract the scheduler needs:
// list due sources, advance last-fetch timestamps, flip the active flag.
//
// `mark_fetched` is called after every attempted poll, successful or not. A
// permanently-failing source therefore waits out its full interval instead of
// being retried on every sweep tick; the cost is slower recovery once the
// source comes back.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{FeedError, FeedResult};
use crate::model::{Category, Persona, Source, SourceId, MIN_POLL_INTERVAL_MS};

#[derive(Debug, Default)]
pub struct SourceRegistry {
    inner: Mutex<Vec<Source>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source. Enforces URL uniqueness and the interval floor.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &self,
        name: &str,
        url: &str,
        label: &str,
        category: Category,
        personas: Vec<Persona>,
        interval: Duration,
        active: bool,
    ) -> FeedResult<SourceId> {
        if interval < Duration::from_millis(MIN_POLL_INTERVAL_MS) {
            return Err(FeedError::InvalidConfig(format!(
                "poll interval for {url} below {MIN_POLL_INTERVAL_MS} ms floor"
            )));
        }
        let mut v = self.inner.lock().expect("registry mutex poisoned");
        if v.iter().any(|s| s.url == url) {
            return Err(FeedError::InvalidConfig(format!("duplicate source url {url}")));
        }
        let id = SourceId(v.len() as u32 + 1);
        v.push(Source {
            id,
            name: name.to_string(),
            url: url.to_string(),
            label: label.to_string(),
            category,
            personas,
            interval,
            active,
            last_fetched: None,
        });
        Ok(id)
    }

    /// Active sources whose interval has elapsed (or that were never fetched).
    pub fn list_due(&self, now: DateTime<Utc>) -> Vec<Source> {
        let v = self.inner.lock().expect("registry mutex poisoned");
        v.iter().filter(|s| s.is_due(now)).cloned().collect()
    }

    /// Advance the last-fetch timestamp unconditionally.
    pub fn mark_fetched(&self, id: SourceId, at: DateTime<Utc>) {
        let mut v = self.inner.lock().expect("registry mutex poisoned");
        if let Some(s) = v.iter_mut().find(|s| s.id == id) {
            s.last_fetched = Some(at);
        }
    }

    /// Sources are never deleted at runtime; they are deactivated instead.
    pub fn set_active(&self, id: SourceId, active: bool) -> bool {
        let mut v = self.inner.lock().expect("registry mutex poisoned");
        match v.iter_mut().find(|s| s.id == id) {
            Some(s) => {
                s.active = active;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: SourceId) -> Option<Source> {
        let v = self.inner.lock().expect("registry mutex poisoned");
        v.iter().find(|s| s.id == id).cloned()
    }

    pub fn snapshot(&self) -> Vec<Source> {
        self.inner.lock().expect("registry mutex poisoned").clone()
    }
}
