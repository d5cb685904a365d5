// src/api.rs
// HTTP read surface consumed by the platform frontend, plus the admin
// force-poll. Ingestion failures never leak onto the read path; only
// /admin/poll reports per-source outcomes.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::ingest::scheduler::{Scheduler, SweepSummary};
use crate::model::{Category, CautionItem, ItemId, Persona, Severity};
use crate::registry::SourceRegistry;
use crate::store::{CautionStore, PersonaStats, QueryFilter};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SourceRegistry>,
    pub store: Arc<CautionStore>,
    pub scheduler: Arc<Scheduler>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/cautions", get(list_cautions))
        .route("/cautions/categories", get(list_categories))
        .route("/cautions/stats", get(persona_stats))
        .route("/cautions/{id}/view", post(record_view))
        .route("/admin/sources", get(list_sources))
        .route("/admin/poll", post(force_poll))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Wire form of one caution item.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub severity: Severity,
    pub personas: Vec<Persona>,
    pub source: SourceRef,
    pub published_date: DateTime<Utc>,
    pub link: String,
    pub tags: Vec<String>,
    pub view_count: u64,
}

#[derive(Debug, Serialize)]
pub struct SourceRef {
    pub name: String,
    pub url: String,
}

impl From<CautionItem> for ItemView {
    fn from(it: CautionItem) -> Self {
        Self {
            id: it.id.0,
            title: it.title,
            description: it.description,
            category: it.category,
            severity: it.severity,
            personas: it.personas,
            source: SourceRef {
                name: it.source_name,
                url: it.source_url,
            },
            published_date: it.published,
            link: it.link,
            tags: it.tags,
            view_count: it.view_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CautionsQuery {
    /// Required; a request without a persona is a 400.
    persona: Persona,
    #[serde(default)]
    page: usize,
    #[serde(default)]
    limit: usize,
    category: Option<Category>,
    severity: Option<Severity>,
    start_date: Option<String>,
}

#[derive(Debug, Serialize)]
struct CautionsPage {
    items: Vec<ItemView>,
    total: usize,
    page: usize,
    limit: usize,
    pages: usize,
}

fn parse_start_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc())
}

async fn list_cautions(
    State(state): State<AppState>,
    Query(q): Query<CautionsQuery>,
) -> Result<Json<CautionsPage>, (StatusCode, String)> {
    let since = match q.start_date.as_deref() {
        None => None,
        Some(s) => Some(parse_start_date(s).ok_or((
            StatusCode::BAD_REQUEST,
            format!("unparseable start_date {s:?}"),
        ))?),
    };

    let page = state.store.query(
        q.persona,
        &QueryFilter {
            page: q.page,
            limit: q.limit,
            category: q.category,
            severity: q.severity,
            since,
        },
    );

    Ok(Json(CautionsPage {
        items: page.items.into_iter().map(ItemView::from).collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
        pages: page.pages,
    }))
}

async fn list_categories() -> Json<Vec<&'static str>> {
    Json(Category::ALL.iter().map(|c| c.as_str()).collect())
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    persona: Persona,
}

async fn persona_stats(
    State(state): State<AppState>,
    Query(q): Query<StatsQuery>,
) -> Json<PersonaStats> {
    Json(state.store.stats(q.persona, Utc::now()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewCount {
    view_count: u64,
}

async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ViewCount>, StatusCode> {
    match state.store.increment_view_count(ItemId(id)) {
        Some(view_count) => Ok(Json(ViewCount { view_count })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceView {
    name: String,
    url: String,
    label: String,
    category: Category,
    personas: Vec<Persona>,
    active: bool,
    last_fetched: Option<DateTime<Utc>>,
}

async fn list_sources(State(state): State<AppState>) -> Json<Vec<SourceView>> {
    let out = state
        .registry
        .snapshot()
        .into_iter()
        .map(|s| SourceView {
            name: s.name,
            url: s.url,
            label: s.label,
            category: s.category,
            personas: s.personas,
            active: s.active,
            last_fetched: s.last_fetched,
        })
        .collect();
    Json(out)
}

/// Immediate out-of-cycle sweep; returns the per-source summary. Sources not
/// yet due are untouched, and in-flight sources are skipped by the guard.
async fn force_poll(State(state): State<AppState>) -> Json<SweepSummary> {
    Json(state.scheduler.poll_sweep_once(Utc::now()).await)
}
