//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Use the default comparer (and with it the hash-keyed fast path) for
    /// record keys. When false, keys are compared through a custom structural
    /// comparer and every keyed operator falls back to linear scans.
    pub hash_fast_path: bool,

    /// Reject sources with more rows than this when loading them.
    pub max_source_rows: Option<usize>,

    /// Emit one metrics event per executed pipeline step.
    pub trace_steps: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hash_fast_path: true,
            max_source_rows: None,
            trace_steps: false,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `LAZYQ_HASH_FAST_PATH`: `true`/`false`
    /// - `LAZYQ_MAX_SOURCE_ROWS`: row cap per loaded source
    /// - `LAZYQ_TRACE_STEPS`: `true`/`false`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("LAZYQ_HASH_FAST_PATH").and_then(|s| parse_bool(&s)) {
            cfg.hash_fast_path = v;
        }

        if let Some(s) = lookup("LAZYQ_MAX_SOURCE_ROWS") {
            if let Ok(v) = s.trim().parse::<usize>() {
                cfg.max_source_rows = Some(v);
            }
        }

        if let Some(v) = lookup("LAZYQ_TRACE_STEPS").and_then(|s| parse_bool(&s)) {
            cfg.trace_steps = v;
        }

        cfg
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
