use crate::alert::{AlertEvent, SyslogEmitter};
use crate::config::Config;
use crate::detect::metrics::{MetricsComputer, MetricsSnapshot};
use crate::detect::score::{self, ScoreResult};
use crate::loki::client::LogStore;
use crate::loki::extract::extract_lines;
use anyhow::Result;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// What one successful detection cycle produced.
#[derive(Debug, serde::Serialize)]
pub struct CycleOutcome {
    pub metrics: MetricsSnapshot,
    pub score: ScoreResult,
    pub alerted: bool,
}

/// Drives the detection cycle: compute window bounds, fetch, extract,
/// score, conditionally alert. One cycle runs to completion before the
/// next begins; there is no shared mutable state across cycles.
pub struct DetectionEngine<S: LogStore> {
    store: S,
    emitter: SyslogEmitter,
    computer: MetricsComputer,
    config: Config,
}

impl<S: LogStore> DetectionEngine<S> {
    pub fn new(store: S, emitter: SyslogEmitter, config: Config) -> Self {
        Self {
            store,
            emitter,
            computer: MetricsComputer::new(),
            config,
        }
    }

    /// Run one detection cycle over the window `[now - window, now)`.
    /// Fetch and scoring errors propagate to the caller; emitter failures
    /// are logged and swallowed here.
    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        let end = chrono::Utc::now();
        let start = end - chrono::Duration::minutes(self.config.window_minutes as i64);

        let response = self
            .store
            .query_range(&self.config.query, start, end, self.config.limit)
            .await?;
        let lines = extract_lines(&response);
        let metrics = self.computer.compute(&lines, self.config.window_minutes);
        let result = score::score(&metrics, &self.config.thresholds);

        // One status line per cycle, threshold crossed or not.
        info!(
            "total={} log_rate={:.2}/min sec_rate={:.2}/min err_rate={:.2}/min thr_avg={} score={:.2} reasons={:?}",
            metrics.total,
            metrics.log_rate,
            metrics.security_rate,
            metrics.error_rate,
            metrics
                .throughput_avg
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| "none".to_string()),
            result.score,
            result.reasons,
        );

        let alerted = result.score >= self.config.score_threshold;
        if alerted {
            let event = AlertEvent::from_window(&metrics, &result, self.config.window_minutes);
            self.send_alert(&event).await;
        }

        Ok(CycleOutcome {
            metrics,
            score: result,
            alerted,
        })
    }

    /// Best-effort emission. Transmission failures never escalate past
    /// this call.
    async fn send_alert(&self, event: &AlertEvent) {
        let message = event.format_message();
        match self.emitter.emit(&message).await {
            Ok(()) => info!(dest = %self.config.syslog_addr, "Alert sent: {message}"),
            Err(e) => warn!("Failed to send alert datagram: {e:#}"),
        }
    }

    /// Run the polling loop until `shutdown` flips true (or its sender is
    /// dropped). A failed cycle is logged, converted into a fixed
    /// medium-severity alert, and followed by the normal sleep; one bad
    /// cycle never terminates the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            window_minutes = self.config.window_minutes,
            poll_seconds = self.config.poll_seconds,
            threshold = self.config.score_threshold,
            query = %self.config.query,
            "Detection loop started"
        );

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            if let Err(e) = self.run_cycle().await {
                error!("Cycle failed: {e:#}");
                self.send_alert(&AlertEvent::engine_error(&format!("{e:#}"))).await;
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(self.config.poll_seconds)) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Detection loop stopped");
    }
}
