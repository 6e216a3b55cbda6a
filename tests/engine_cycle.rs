//! Detection-cycle tests against a mock log store, with alert datagrams
//! captured on a loopback UDP socket.

use chrono::{DateTime, Utc};
use lokiwatch::alert::SyslogEmitter;
use lokiwatch::config::Config;
use lokiwatch::detect::engine::DetectionEngine;
use lokiwatch::loki::client::LogStore;
use lokiwatch::loki::{LogStream, LokiError, QueryData, QueryRangeResponse};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::watch;

/// Serves the same set of lines on every query.
struct CannedStore {
    lines: Vec<String>,
}

#[async_trait::async_trait]
impl LogStore for CannedStore {
    async fn query_range(
        &self,
        _selector: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _limit: u32,
    ) -> Result<QueryRangeResponse, LokiError> {
        let values = self
            .lines
            .iter()
            .enumerate()
            .map(|(i, text)| (format!("17000000000000000{i:02}"), text.clone()))
            .collect();
        Ok(QueryRangeResponse {
            data: QueryData {
                result: vec![LogStream { values }],
            },
        })
    }
}

/// Fails every query, as a down or timing-out backend would.
struct DownStore;

#[async_trait::async_trait]
impl LogStore for DownStore {
    async fn query_range(
        &self,
        _selector: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        _limit: u32,
    ) -> Result<QueryRangeResponse, LokiError> {
        Err(LokiError::Status { code: 502 })
    }
}

async fn capture_socket() -> (UdpSocket, std::net::SocketAddr) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    (socket, addr)
}

async fn recv_line(socket: &UdpSocket) -> String {
    let mut buf = [0u8; 4096];
    let (n, _) = tokio::time::timeout(Duration::from_secs(5), socket.recv_from(&mut buf))
        .await
        .expect("timed out waiting for alert datagram")
        .unwrap();
    String::from_utf8_lossy(&buf[..n]).into_owned()
}

fn config_with(addr: std::net::SocketAddr) -> Config {
    Config {
        syslog_addr: addr,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_high_log_rate_window_alerts() {
    let (socket, addr) = capture_socket().await;
    let store = CannedStore {
        lines: (0..100).map(|i| format!("routine message {i}")).collect(),
    };
    let engine = DetectionEngine::new(store, SyslogEmitter::new(addr), config_with(addr));

    let outcome = engine.run_cycle().await.unwrap();
    assert_eq!(outcome.metrics.total, 100);
    assert_eq!(outcome.metrics.log_rate, 20.0);
    assert_eq!(outcome.score.score, 0.35);
    assert_eq!(outcome.score.reasons, vec!["high_log_rate"]);
    assert!(outcome.alerted);

    let line = recv_line(&socket).await;
    assert!(line.contains("AI_ALERT severity=high score=0.35 window=5m total=100"));
    assert!(line.contains("reason=\"high_log_rate\""));
}

#[tokio::test]
async fn test_quiet_window_does_not_alert() {
    let (socket, addr) = capture_socket().await;
    let store = CannedStore {
        lines: vec!["all quiet".to_string()],
    };
    let engine = DetectionEngine::new(store, SyslogEmitter::new(addr), config_with(addr));

    let outcome = engine.run_cycle().await.unwrap();
    assert_eq!(outcome.score.score, 0.0);
    assert!(!outcome.alerted);

    let mut buf = [0u8; 64];
    let got = tokio::time::timeout(Duration::from_millis(200), socket.recv_from(&mut buf)).await;
    assert!(got.is_err(), "no datagram expected for a quiet window");
}

#[tokio::test]
async fn test_threshold_above_one_suppresses_all_alerts() {
    let (socket, addr) = capture_socket().await;
    // Trips every rule: volume, auth, errors, low throughput.
    let store = CannedStore {
        lines: (0..120)
            .map(|i| format!("auth error blocked Throughput=0.01 msg {i}"))
            .collect(),
    };
    let mut config = config_with(addr);
    config.score_threshold = 1.01;
    let engine = DetectionEngine::new(store, SyslogEmitter::new(addr), config);

    let outcome = engine.run_cycle().await.unwrap();
    assert_eq!(outcome.score.score, 1.0);
    assert!(!outcome.alerted);

    let mut buf = [0u8; 64];
    let got = tokio::time::timeout(Duration::from_millis(200), socket.recv_from(&mut buf)).await;
    assert!(got.is_err(), "threshold above 1.0 must suppress alerts");
}

#[tokio::test]
async fn test_backend_failure_alerts_and_loop_survives() {
    let (socket, addr) = capture_socket().await;
    let mut config = config_with(addr);
    config.poll_seconds = 1;
    let engine = DetectionEngine::new(DownStore, SyslogEmitter::new(addr), config);

    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(async move { engine.run(rx).await });

    // First failed cycle produces the fixed medium-severity alert.
    let line = recv_line(&socket).await;
    assert!(line.contains("AI_ALERT severity=medium score=0.50"));
    assert!(line.contains("ai_engine_error"));
    assert!(line.contains("502"));

    // The loop keeps cycling after the failure.
    let line = recv_line(&socket).await;
    assert!(line.contains("severity=medium"));

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("loop did not stop after shutdown signal")
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_interrupts_sleep() {
    let (_socket, addr) = capture_socket().await;
    let store = CannedStore { lines: vec![] };
    let mut config = config_with(addr);
    // Long enough that only a cooperative shutdown can end the test quickly.
    config.poll_seconds = 3600;
    let engine = DetectionEngine::new(store, SyslogEmitter::new(addr), config);

    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(async move { engine.run(rx).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("shutdown did not interrupt the poll sleep")
        .unwrap();
}
