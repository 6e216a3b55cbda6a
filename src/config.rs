//! Process configuration: built-in defaults, optional TOML file, then
//! `LOKIWATCH_*` environment overrides, in that order. The resulting
//! struct is immutable at runtime and passed into components at
//! construction.

use crate::detect::score::Thresholds;
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_LOKI_URL: &str = "http://localhost:3100";
pub const DEFAULT_QUERY: &str = r#"{job="syslog", source="syslogng"}"#;
pub const DEFAULT_WINDOW_MINUTES: u32 = 5;
pub const DEFAULT_POLL_SECONDS: u64 = 60;
pub const DEFAULT_LIMIT: u32 = 5000;
pub const DEFAULT_SYSLOG_ADDR: &str = "127.0.0.1:5140";
pub const DEFAULT_SCORE_THRESHOLD: f64 = 0.10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Loki instance to poll.
    pub loki_url: String,
    /// Stream selector passed through to `query_range` verbatim.
    pub query: String,
    /// Rolling window length. Windows overlap when this exceeds the poll
    /// interval; re-detection on overlapping data is expected.
    pub window_minutes: u32,
    /// Seconds to sleep between detection cycles.
    pub poll_seconds: u64,
    /// Maximum lines fetched per window.
    pub limit: u32,
    /// UDP destination for AI_ALERT datagrams.
    pub syslog_addr: SocketAddr,
    /// Minimum score that triggers an alert.
    pub score_threshold: f64,
    /// Scoring rule cutoffs and weights.
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loki_url: DEFAULT_LOKI_URL.to_string(),
            query: DEFAULT_QUERY.to_string(),
            window_minutes: DEFAULT_WINDOW_MINUTES,
            poll_seconds: DEFAULT_POLL_SECONDS,
            limit: DEFAULT_LIMIT,
            syslog_addr: DEFAULT_SYSLOG_ADDR
                .parse()
                .expect("Failed to parse default syslog address"),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    /// Load the effective config: defaults, then the TOML file if given,
    /// then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file {}", p.display()))?;
                toml::from_str(&raw)
                    .with_context(|| format!("Failed to parse config file {}", p.display()))?
            }
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `LOKIWATCH_*` overrides from a lookup function. Injectable so
    /// tests run without touching process environment.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        override_from(&get, "LOKIWATCH_LOKI_URL", &mut self.loki_url);
        override_from(&get, "LOKIWATCH_QUERY", &mut self.query);
        override_from(&get, "LOKIWATCH_WINDOW_MINUTES", &mut self.window_minutes);
        override_from(&get, "LOKIWATCH_POLL_SECONDS", &mut self.poll_seconds);
        override_from(&get, "LOKIWATCH_LIMIT", &mut self.limit);
        override_from(&get, "LOKIWATCH_SYSLOG_ADDR", &mut self.syslog_addr);
        override_from(&get, "LOKIWATCH_SCORE_THRESHOLD", &mut self.score_threshold);
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.loki_url.is_empty(), "loki_url must not be empty");
        ensure!(!self.query.is_empty(), "query must not be empty");
        ensure!(self.window_minutes >= 1, "window_minutes must be at least 1");
        ensure!(self.poll_seconds >= 1, "poll_seconds must be at least 1");
        ensure!(self.limit >= 1, "limit must be at least 1");
        Ok(())
    }
}

fn override_from<T>(get: impl Fn(&str) -> Option<String>, key: &str, slot: &mut T)
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = get(key) {
        match raw.parse() {
            Ok(value) => *slot = value,
            Err(e) => tracing::warn!(%key, %raw, "Ignoring unparseable override: {e}"),
        }
    }
}
