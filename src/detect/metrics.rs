use crate::loki::LogLine;
use regex::Regex;

/// Substrings (matched against lower-cased text) that count a line as
/// security/auth activity.
pub const SECURITY_MARKERS: [&str; 2] = ["security:", "auth"];

/// Substrings (matched against lower-cased text) that count a line as a
/// failure.
pub const ERROR_MARKERS: [&str; 4] = ["error", "failed", "deny", "blocked"];

/// Per-window metrics, derived once per cycle and immutable afterwards.
///
/// Rates are counts per minute over the configured window, with a minimum
/// window of one minute. `throughput_avg` is `None` when no line carried a
/// throughput field; callers must keep "no data" distinct from zero.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub log_rate: f64,
    pub security_count: u64,
    pub security_rate: f64,
    pub error_count: u64,
    pub error_rate: f64,
    pub throughput_avg: Option<f64>,
}

impl MetricsSnapshot {
    /// Snapshot of an empty window.
    pub fn empty() -> Self {
        Self {
            total: 0,
            log_rate: 0.0,
            security_count: 0,
            security_rate: 0.0,
            error_count: 0,
            error_rate: 0.0,
            throughput_avg: None,
        }
    }
}

/// Single-pass metrics scan over a window of log lines.
pub struct MetricsComputer {
    throughput_re: Regex,
}

impl MetricsComputer {
    pub fn new() -> Self {
        Self {
            throughput_re: Regex::new(r"Throughput=([0-9]*\.?[0-9]+)")
                .expect("Failed to compile throughput regex"),
        }
    }

    pub fn compute(&self, lines: &[LogLine], window_minutes: u32) -> MetricsSnapshot {
        let total = lines.len() as u64;
        let mut security_count = 0u64;
        let mut error_count = 0u64;
        let mut throughput_sum = 0.0f64;
        let mut throughput_samples = 0u64;

        for line in lines {
            let lowered = line.text.to_lowercase();

            if SECURITY_MARKERS.iter().any(|m| lowered.contains(m)) {
                security_count += 1;
            }

            if ERROR_MARKERS.iter().any(|m| lowered.contains(m)) {
                error_count += 1;
            }

            // Throughput field keeps its original casing on the wire.
            if let Some(caps) = self.throughput_re.captures(&line.text) {
                if let Ok(value) = caps[1].parse::<f64>() {
                    throughput_sum += value;
                    throughput_samples += 1;
                }
            }
        }

        let minutes = window_minutes.max(1) as f64;

        MetricsSnapshot {
            total,
            log_rate: total as f64 / minutes,
            security_count,
            security_rate: security_count as f64 / minutes,
            error_count,
            error_rate: error_count as f64 / minutes,
            throughput_avg: if throughput_samples > 0 {
                Some(throughput_sum / throughput_samples as f64)
            } else {
                None
            },
        }
    }
}

impl Default for MetricsComputer {
    fn default() -> Self {
        Self::new()
    }
}
