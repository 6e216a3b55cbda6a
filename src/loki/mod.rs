//! Loki range-query client and response handling.

pub mod client;
pub mod extract;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LokiError {
    #[error("loki backend unreachable: {0}")]
    Backend(#[from] reqwest::Error),

    #[error("loki returned status {code}")]
    Status { code: u16 },
}

/// Wire shape of a Loki `query_range` response. Every level defaults to
/// empty so a structurally absent `data.result` deserializes cleanly
/// instead of failing the cycle.
#[derive(Debug, Default, serde::Deserialize)]
pub struct QueryRangeResponse {
    #[serde(default)]
    pub data: QueryData,
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct QueryData {
    #[serde(default)]
    pub result: Vec<LogStream>,
}

/// One stream in the response: `values` holds `[timestamp_ns, text]` pairs,
/// timestamps as decimal strings per the Loki API.
#[derive(Debug, Default, serde::Deserialize)]
pub struct LogStream {
    #[serde(default)]
    pub values: Vec<(String, String)>,
}

/// A single log line pulled from the backend. Lives for one detection
/// cycle; never retained across cycles.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub timestamp_ns: i64,
    pub text: String,
}
