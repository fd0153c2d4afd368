//! Layered build configuration: compiled defaults, then an optional TOML
//! file, then `ATLAS_*` environment variables. Flag overrides happen in
//! `main` after loading.

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use atlas_model::BuildConfig;

/// Picked up from the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "code-atlas.toml";

/// File-level view of the config: every key optional, unknown keys are
/// errors so typos fail loudly instead of silently keeping a default.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    concurrency: Option<usize>,
    timeout_secs: Option<u64>,
    retries: Option<u32>,
    callsite_cap: Option<usize>,
    min_summary_lines: Option<usize>,
    decay: Option<f64>,
    bm25_k1: Option<f64>,
    bm25_b: Option<f64>,
    model: Option<String>,
}

/// Loads the effective configuration. An explicit path must exist; the
/// default file is optional.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<BuildConfig> {
    let mut config = BuildConfig::default();
    match explicit {
        Some(path) => apply_file(&mut config, read_file(path)?),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                apply_file(&mut config, read_file(default)?);
            }
        }
    }
    apply_env(&mut config);
    Ok(config)
}

fn read_file(path: &Path) -> anyhow::Result<FileConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn apply_file(config: &mut BuildConfig, file: FileConfig) {
    if let Some(value) = file.concurrency {
        config.concurrency = value;
    }
    if let Some(value) = file.timeout_secs {
        config.timeout = Duration::from_secs(value);
    }
    if let Some(value) = file.retries {
        config.retries = value;
    }
    if let Some(value) = file.callsite_cap {
        config.callsite_cap = value;
    }
    if let Some(value) = file.min_summary_lines {
        config.min_summary_lines = value;
    }
    if let Some(value) = file.decay {
        config.decay = value;
    }
    if let Some(value) = file.bm25_k1 {
        config.bm25_k1 = value;
    }
    if let Some(value) = file.bm25_b {
        config.bm25_b = value;
    }
    if let Some(value) = file.model {
        config.model = value;
    }
}

fn apply_env(config: &mut BuildConfig) {
    if let Some(value) = env_parse("ATLAS_CONCURRENCY") {
        config.concurrency = value;
    }
    if let Some(value) = env_parse("ATLAS_TIMEOUT_SECS") {
        config.timeout = Duration::from_secs(value);
    }
    if let Some(value) = env_parse("ATLAS_RETRIES") {
        config.retries = value;
    }
    if let Some(value) = env_parse("ATLAS_CALLSITE_CAP") {
        config.callsite_cap = value;
    }
    if let Some(value) = env_parse("ATLAS_MIN_SUMMARY_LINES") {
        config.min_summary_lines = value;
    }
    if let Some(value) = env_parse("ATLAS_DECAY") {
        config.decay = value;
    }
    if let Ok(value) = env::var("ATLAS_MODEL") {
        if !value.is_empty() {
            config.model = value;
        }
    }
}

/// Reads and parses one environment variable, warning instead of failing
/// when the value does not parse.
fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("ignoring unparseable {name}={raw}");
            None
        }
    }
}
