//! Alert construction and best-effort syslog emission.

use crate::detect::metrics::MetricsSnapshot;
use crate::detect::score::ScoreResult;
use crate::detect::Severity;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// Fixed originating-host token in the syslog line. Deliberately not the
/// machine hostname, so the alert stream stays greppable across
/// deployments.
pub const SYSLOG_HOST: &str = "ai-engine";

/// Fixed application tag in the syslog line.
pub const SYSLOG_TAG: &str = "ai-detector";

/// Fixed score assigned to cycle-failure alerts.
pub const ENGINE_ERROR_SCORE: f64 = 0.50;

/// An alert about one evaluated window (or one failed cycle). Transient:
/// built, serialized, transmitted, dropped.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlertEvent {
    pub severity: Severity,
    pub score: f64,
    pub window_minutes: u32,
    pub total: u64,
    pub security_count: u64,
    pub error_count: u64,
    pub throughput_avg: Option<f64>,
    pub reasons: Vec<String>,
}

impl AlertEvent {
    /// Threshold-triggered alert for an evaluated window.
    pub fn from_window(metrics: &MetricsSnapshot, result: &ScoreResult, window_minutes: u32) -> Self {
        Self {
            severity: Severity::High,
            score: result.score,
            window_minutes,
            total: metrics.total,
            security_count: metrics.security_count,
            error_count: metrics.error_count,
            throughput_avg: metrics.throughput_avg,
            reasons: result.reasons.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Fixed-content alert for a failed cycle.
    pub fn engine_error(message: &str) -> Self {
        Self {
            severity: Severity::Medium,
            score: ENGINE_ERROR_SCORE,
            window_minutes: 0,
            total: 0,
            security_count: 0,
            error_count: 0,
            throughput_avg: None,
            reasons: vec![format!("ai_engine_error {message}")],
        }
    }

    /// Render the single-line AI_ALERT payload. Failure alerts carry only
    /// severity, score, and reason; window alerts carry the full metric set.
    pub fn format_message(&self) -> String {
        let reasons = self.reasons.join(",");
        match self.severity {
            Severity::High => {
                let thr = self
                    .throughput_avg
                    .map(|v| format!("{v:.2}"))
                    .unwrap_or_default();
                format!(
                    "AI_ALERT severity={} score={:.2} window={}m total={} sec={} errors={} thr_avg={} reason=\"{}\"",
                    self.severity,
                    self.score,
                    self.window_minutes,
                    self.total,
                    self.security_count,
                    self.error_count,
                    thr,
                    reasons,
                )
            }
            Severity::Medium => format!(
                "AI_ALERT severity={} score={:.2} reason=\"{}\"",
                self.severity, self.score, reasons,
            ),
        }
    }
}

/// Fire-and-forget UDP transport into the syslog ingestion point.
///
/// One datagram per call on a fresh socket; no acknowledgment, no retry,
/// no buffering. Send failures are returned for the caller to log and
/// swallow, never to escalate.
pub struct SyslogEmitter {
    dest: SocketAddr,
}

impl SyslogEmitter {
    pub fn new(dest: SocketAddr) -> Self {
        Self { dest }
    }

    pub async fn emit(&self, message: &str) -> Result<()> {
        let ts = chrono::Local::now().format("%b %d %H:%M:%S");
        let line = format!("{ts} {SYSLOG_HOST} {SYSLOG_TAG}: {message}");

        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .context("Failed to bind alert socket")?;
        socket
            .send_to(line.as_bytes(), self.dest)
            .await
            .context("Failed to send alert datagram")?;
        Ok(())
    }
}
