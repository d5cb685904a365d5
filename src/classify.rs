// src/classify.rs
// Rule-based classifier for ingested entries. Pure, no I/O.
//
// Severity tiers are checked in descending priority over the lower-cased
// title+summary; the first tier with a hit wins. Tag groups are independent
// membership tests, so any number of tags may apply. These keyword sets are
// the classification contract; edit with care.

use crate::model::Severity;

const CRITICAL: &[&str] = &["zero-day", "ransomware", "breach", "urgent", "exploit"];
const HIGH: &[&str] = &["vulnerability", "malware", "attack", "phishing", "hack"];
const MEDIUM: &[&str] = &["warning", "alert", "risk", "caution"];

const TAG_GROUPS: &[(&str, &[&str])] = &[
    ("passwords", &["password", "credential", "login"]),
    ("email", &["email", "phishing", "inbox"]),
    (
        "social-media",
        &[
            "facebook",
            "instagram",
            "tiktok",
            "twitter",
            "snapchat",
            "whatsapp",
        ],
    ),
    (
        "mobile",
        &["mobile", "phone", "smartphone", "android", "iphone", "app"],
    ),
    (
        "financial",
        &["bank", "credit card", "financial", "payment", "money"],
    ),
    (
        "children",
        &["child", "children", "kids", "teen", "parental"],
    ),
    (
        "government",
        &["government", "irs", "tax", "policy", "regulation"],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub severity: Severity,
    pub tags: Vec<String>,
}

/// Classify an entry from its title and summary text.
pub fn classify(title: &str, summary: &str) -> Classification {
    let text = format!("{} {}", title, summary).to_lowercase();

    let severity = if contains_any(&text, CRITICAL) {
        Severity::Critical
    } else if contains_any(&text, HIGH) {
        Severity::High
    } else if contains_any(&text, MEDIUM) {
        Severity::Medium
    } else {
        Severity::Low
    };

    let tags = TAG_GROUPS
        .iter()
        .filter(|(_, words)| contains_any(&text, words))
        .map(|(tag, _)| (*tag).to_string())
        .collect();

    Classification { severity, tags }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
