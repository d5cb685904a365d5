// src/config.rs
// Seed-source file loading plus runtime settings from the environment.
//
// Sources are seed data: read once at startup, validated, and handed to the
// registry. Supports TOML (preferred) or a JSON array, resolved via
// $CAUTION_SOURCES_PATH with config/ fallbacks.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ingest::scheduler::SchedulerCfg;
use crate::model::{Category, Persona};
use crate::registry::SourceRegistry;

const ENV_SOURCES_PATH: &str = "CAUTION_SOURCES_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedSource {
    pub name: String,
    pub url: String,
    /// Display name; defaults to `name`.
    pub label: Option<String>,
    pub category: Category,
    pub personas: Vec<Persona>,
    pub poll_interval_ms: u64,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    sources: Vec<SeedSource>,
}

pub fn load_sources_from(path: &Path) -> Result<Vec<SeedSource>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_sources(&content, &ext)
}

/// Resolve the seed file:
/// 1) $CAUTION_SOURCES_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
pub fn load_sources_default() -> Result<Vec<SeedSource>> {
    if let Ok(p) = std::env::var(ENV_SOURCES_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("CAUTION_SOURCES_PATH points to non-existent path"));
        }
        return load_sources_from(&pb);
    }
    let toml_p = PathBuf::from("config/sources.toml");
    if toml_p.exists() {
        return load_sources_from(&toml_p);
    }
    let json_p = PathBuf::from("config/sources.json");
    if json_p.exists() {
        return load_sources_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<SeedSource>> {
    if hint_ext == "json" {
        let v: Vec<SeedSource> = serde_json::from_str(s).context("parsing sources json")?;
        return Ok(v);
    }
    let f: SeedFile = toml::from_str(s).context("parsing sources toml")?;
    Ok(f.sources)
}

/// Register every seed; the registry enforces URL uniqueness and the
/// interval floor. Returns the number registered.
pub fn seed_registry(registry: &SourceRegistry, seeds: Vec<SeedSource>) -> Result<usize> {
    let mut n = 0;
    for seed in seeds {
        let label = seed.label.as_deref().unwrap_or(&seed.name);
        registry.add(
            &seed.name,
            &seed.url,
            label,
            seed.category,
            seed.personas,
            Duration::from_millis(seed.poll_interval_ms),
            seed.active,
        )?;
        n += 1;
    }
    Ok(n)
}

/// Runtime knobs, all env-overridable with sane defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub scheduler: SchedulerCfg,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("CAUTION_BIND_ADDR", "0.0.0.0:8000")
            .parse()
            .context("parsing CAUTION_BIND_ADDR")?;
        let defaults = SchedulerCfg::default();
        let scheduler = SchedulerCfg {
            poll_sweep: Duration::from_secs(env_parse(
                "CAUTION_POLL_SWEEP_SECS",
                defaults.poll_sweep.as_secs(),
            )?),
            retention_sweep: Duration::from_secs(env_parse(
                "CAUTION_RETENTION_SWEEP_SECS",
                defaults.retention_sweep.as_secs(),
            )?),
            retention_days: env_parse("CAUTION_RETENTION_DAYS", defaults.retention_days)?,
        };
        Ok(Self {
            bind_addr,
            scheduler,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) => v.parse().with_context(|| format!("parsing {key}")),
        Err(_) => Ok(default),
    }
}
