// src/fetch.rs
// Feed Fetcher: pulls one source's RSS document and normalizes it into
// `RawEntry` values. All upstream format quirks stop here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{FeedError, FeedResult};
use crate::model::{RawEntry, Source};

/// Upper bound on one feed retrieval, so a single unreachable source cannot
/// stall a whole sweep.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_TEXT_LEN: usize = 2000;

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &Source) -> FeedResult<Vec<RawEntry>>;
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    // `content:encoded`; quick-xml may surface the qname with or without
    // its prefix depending on how the producer declares the namespace.
    #[serde(rename = "encoded", alias = "content:encoded")]
    content: Option<String>,
}

/// Strip markup and collapse an RSS text field into plain prose.
pub fn normalize_text(s: &str) -> String {
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();

    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());

    let without_tags = re_tags.replace_all(s, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    let mut out = re_ws.replace_all(&decoded, " ").trim().to_string();

    if out.chars().count() > MAX_TEXT_LEN {
        out = out.chars().take(MAX_TEXT_LEN).collect();
    }
    out
}

fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// RSS bodies in the wild carry bare HTML entities that are not valid XML;
// replace the common ones before handing the document to the parser.
fn scrub_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Parse an RSS document into normalized entries. Entries without a link are
/// kept (with an empty link) so the ingester can report them individually.
pub fn parse_feed(source_url: &str, xml: &str) -> FeedResult<Vec<RawEntry>> {
    let t0 = std::time::Instant::now();
    let cleaned = scrub_entities_for_xml(xml);
    let rss: Rss = from_str(&cleaned).map_err(|e| FeedError::SourceMalformed {
        url: source_url.to_string(),
        reason: e.to_string(),
    })?;

    let mut out = Vec::with_capacity(rss.channel.items.len());
    for it in rss.channel.items {
        let title = normalize_text(it.title.as_deref().unwrap_or_default());
        let summary = normalize_text(it.description.as_deref().unwrap_or_default());
        if title.is_empty() && summary.is_empty() {
            continue;
        }
        out.push(RawEntry {
            title,
            summary,
            body: it
                .content
                .as_deref()
                .map(normalize_text)
                .filter(|b| !b.is_empty()),
            link: it.link.unwrap_or_default().trim().to_string(),
            published: it.pub_date.as_deref().and_then(parse_pub_date),
        });
    }

    histogram!("caution_fetch_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    counter!("caution_entries_parsed_total").increment(out.len() as u64);
    Ok(out)
}

/// HTTP fetcher used in production. Scheduler tests inject stubs instead.
pub struct RssFetcher {
    client: reqwest::Client,
}

impl RssFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self { client }
    }
}

impl Default for RssFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedFetcher for RssFetcher {
    async fn fetch(&self, source: &Source) -> FeedResult<Vec<RawEntry>> {
        let resp = self
            .client
            .get(&source.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FeedError::SourceUnreachable {
                url: source.url.clone(),
                reason: e.to_string(),
            })?;

        let body = resp.text().await.map_err(|e| FeedError::SourceUnreachable {
            url: source.url.clone(),
            reason: e.to_string(),
        })?;

        parse_feed(&source.url, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_tags_and_entities() {
        let s = "  <p>Stay&nbsp;safe &amp; alert</p>\n\n online ";
        assert_eq!(normalize_text(s), "Stay safe & alert online");
    }

    #[test]
    fn pub_date_parses_rfc2822() {
        let dt = parse_pub_date("Tue, 03 Jun 2025 10:30:00 GMT").unwrap();
        assert_eq!(dt.to_rfc3339(), "2025-06-03T10:30:00+00:00");
        assert!(parse_pub_date("not a date").is_none());
    }
}
