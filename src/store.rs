// src/store.rs
// In-memory caution-item store: dedup-keyed inserts for the ingester, plus
// the persona-filtered read surface the API serves. A database-backed store
// can replace this behind the same methods without touching the pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use crate::model::{Category, CautionItem, ItemId, Persona, Severity, SourceId};

const MAX_PAGE_SIZE: usize = 100;
const DEFAULT_PAGE_SIZE: usize = 20;

/// Everything the ingester supplies for one new item; the store assigns the
/// identity and the runtime fields.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub source_id: SourceId,
    pub source_name: String,
    pub source_url: String,
    pub title: String,
    pub description: String,
    pub body: Option<String>,
    pub category: Category,
    pub personas: Vec<Persona>,
    pub severity: Severity,
    pub tags: Vec<String>,
    pub published: DateTime<Utc>,
    pub link: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(ItemId),
    /// The `(source, link)` dedup key already exists; nothing was written.
    Duplicate,
}

#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
    pub category: Option<Category>,
    pub severity: Option<Severity>,
    pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct QueryPage {
    pub items: Vec<CautionItem>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaStats {
    pub by_severity: BTreeMap<Severity, u64>,
    pub by_category: BTreeMap<Category, u64>,
    /// Items published within the last 7 days.
    pub recent_count: u64,
    pub total_active: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    items: Vec<CautionItem>,
    seen: HashSet<(SourceId, String)>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct CautionStore {
    inner: Mutex<StoreInner>,
}

impl CautionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the `(source, link)` key is already present.
    /// First write wins; a duplicate is not an error.
    pub fn insert_new(&self, new: NewItem) -> InsertOutcome {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let key = (new.source_id, new.link.clone());
        if !inner.seen.insert(key) {
            return InsertOutcome::Duplicate;
        }
        inner.next_id += 1;
        let id = ItemId(inner.next_id);
        inner.items.push(CautionItem {
            id,
            source_id: new.source_id,
            source_name: new.source_name,
            source_url: new.source_url,
            title: new.title,
            description: new.description,
            body: new.body,
            category: new.category,
            personas: new.personas,
            severity: new.severity,
            tags: new.tags,
            published: new.published,
            link: new.link,
            active: true,
            view_count: 0,
        });
        InsertOutcome::Inserted(id)
    }

    /// Persona-filtered page, newest first. Item id breaks published-date
    /// ties so pagination never duplicates or drops rows.
    pub fn query(&self, persona: Persona, filter: &QueryFilter) -> QueryPage {
        let limit = match filter.limit {
            0 => DEFAULT_PAGE_SIZE,
            n => n.min(MAX_PAGE_SIZE),
        };
        let page = filter.page.max(1);

        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut matched: Vec<&CautionItem> = inner
            .items
            .iter()
            .filter(|it| it.active && it.personas.contains(&persona))
            .filter(|it| filter.category.map_or(true, |c| it.category == c))
            .filter(|it| filter.severity.map_or(true, |s| it.severity == s))
            .filter(|it| filter.since.map_or(true, |d| it.published >= d))
            .collect();
        matched.sort_by(|a, b| b.published.cmp(&a.published).then(b.id.cmp(&a.id)));

        let total = matched.len();
        let pages = total.div_ceil(limit);
        // page comes straight off the query string; saturate, never overflow
        let offset = page.saturating_sub(1).saturating_mul(limit);
        let items = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();

        QueryPage {
            items,
            total,
            page,
            limit,
            pages,
        }
    }

    pub fn stats(&self, persona: Persona, now: DateTime<Utc>) -> PersonaStats {
        let week_ago = now - chrono::Duration::days(7);
        let inner = self.inner.lock().expect("store mutex poisoned");

        let mut by_severity = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        let mut recent_count = 0u64;
        let mut total_active = 0u64;

        for it in inner
            .items
            .iter()
            .filter(|it| it.active && it.personas.contains(&persona))
        {
            *by_severity.entry(it.severity).or_insert(0) += 1;
            *by_category.entry(it.category).or_insert(0) += 1;
            if it.published >= week_ago {
                recent_count += 1;
            }
            total_active += 1;
        }

        PersonaStats {
            by_severity,
            by_category,
            recent_count,
            total_active,
        }
    }

    /// Returns the new count, or `None` for an unknown item.
    pub fn increment_view_count(&self, id: ItemId) -> Option<u64> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let it = inner.items.iter_mut().find(|it| it.id == id)?;
        it.view_count += 1;
        Some(it.view_count)
    }

    pub fn set_active(&self, id: ItemId, active: bool) -> bool {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        match inner.items.iter_mut().find(|it| it.id == id) {
            Some(it) => {
                it.active = active;
                true
            }
            None => false,
        }
    }

    /// Hard-delete everything published before `cutoff`. Dedup keys of the
    /// deleted items are released with them.
    pub fn purge_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let before = inner.items.len();
        let mut removed_keys = Vec::new();
        inner.items.retain(|it| {
            if it.published < cutoff {
                removed_keys.push((it.source_id, it.link.clone()));
                false
            } else {
                true
            }
        });
        for key in removed_keys {
            inner.seen.remove(&key);
        }
        before - inner.items.len()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("store mutex poisoned").items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
