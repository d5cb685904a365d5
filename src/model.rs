// src/model.rs
// Core record types shared across the ingestion pipeline and the read path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Floor for per-source poll intervals (5 minutes).
pub const MIN_POLL_INTERVAL_MS: u64 = 300_000;

/// Topical category of a source and of every item ingested from it.
/// Closed set; unknown strings are rejected when configs are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    DataBreach,
    Phishing,
    Scams,
    ParentalControls,
    GeneralSecurity,
    SocialMedia,
    Financial,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::DataBreach,
        Category::Phishing,
        Category::Scams,
        Category::ParentalControls,
        Category::GeneralSecurity,
        Category::SocialMedia,
        Category::Financial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DataBreach => "data-breach",
            Category::Phishing => "phishing",
            Category::Scams => "scams",
            Category::ParentalControls => "parental-controls",
            Category::GeneralSecurity => "general-security",
            Category::SocialMedia => "social-media",
            Category::Financial => "financial",
        }
    }
}

/// Four-level criticality derived from text heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// Audience segment used purely as a filter label on items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Persona {
    General,
    Senior,
    Parent,
    Teen,
    Professional,
}

impl Persona {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::General => "general",
            Persona::Senior => "senior",
            Persona::Parent => "parent",
            Persona::Teen => "teen",
            Persona::Professional => "professional",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// One configured external feed. Created by seeding; at runtime only
/// `last_fetched` and `active` ever change.
#[derive(Debug, Clone)]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    pub url: String,
    /// Display name shown to readers (may differ from the registry name).
    pub label: String,
    pub category: Category,
    pub personas: Vec<Persona>,
    pub interval: Duration,
    pub active: bool,
    pub last_fetched: Option<DateTime<Utc>>,
}

impl Source {
    /// A source is due when active and either never fetched or past its interval.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        if !self.active {
            return false;
        }
        match self.last_fetched {
            None => true,
            Some(at) => {
                let elapsed = now.signed_duration_since(at);
                elapsed >= chrono::Duration::from_std(self.interval).unwrap_or_default()
            }
        }
    }
}

/// One upstream entry, normalized at the fetch boundary. Downstream code
/// never sees feed-format quirks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub summary: String,
    pub body: Option<String>,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
}

/// One ingested, classified, persona-tagged record.
/// Dedup identity is `(source_id, link)`.
#[derive(Debug, Clone)]
pub struct CautionItem {
    pub id: ItemId,
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
    pub active: bool,
    pub view_count: u64,
}
