//! lokiwatch -- polling log-anomaly alerting for Loki-backed syslog pipelines.
//!
//! Each cycle pulls a rolling window of log lines from Loki, derives
//! volumetric and content metrics, applies a fixed rule-based score, and
//! emits an AI_ALERT line over UDP back into the syslog ingestion path
//! when the score crosses the configured threshold. Alerts are themselves
//! log lines, visible to observers and to later cycles.

pub mod alert;
pub mod config;
pub mod detect;
pub mod loki;

use anyhow::Result;
use config::Config;
use detect::engine::{CycleOutcome, DetectionEngine};

fn build_engine(config: Config) -> DetectionEngine<loki::client::LokiClient> {
    let store = loki::client::LokiClient::new(&config.loki_url);
    let emitter = alert::SyslogEmitter::new(config.syslog_addr);
    DetectionEngine::new(store, emitter, config)
}

/// Start the detection daemon and poll until Ctrl+C.
pub async fn run(config: Config) -> Result<()> {
    let engine = build_engine(config);

    let (tx, rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received, shutting down");
            let _ = tx.send(true);
        }
    });

    engine.run(rx).await;
    Ok(())
}

/// Run exactly one detection cycle and return its outcome.
pub async fn scan(config: Config) -> Result<CycleOutcome> {
    build_engine(config).run_cycle().await
}
