use super::{LokiError, QueryRangeResponse};
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Read access to a range-queryable log backend.
#[async_trait::async_trait]
pub trait LogStore: Send + Sync {
    /// Fetch up to `limit` lines matching `selector` within `[start, end)`,
    /// most recent first.
    async fn query_range(
        &self,
        selector: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<QueryRangeResponse, LokiError>;
}

/// HTTP client for Loki's `query_range` endpoint.
pub struct LokiClient {
    client: Client,
    base_url: String,
}

impl LokiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Convert an instant to Loki's integer-nanosecond epoch representation.
pub fn to_ns(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_nanos_opt().unwrap_or_default()
}

#[async_trait::async_trait]
impl LogStore for LokiClient {
    async fn query_range(
        &self,
        selector: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: u32,
    ) -> Result<QueryRangeResponse, LokiError> {
        let url = format!("{}/loki/api/v1/query_range", self.base_url);

        // BACKWARD keeps the most recent lines when the window exceeds
        // `limit`; metrics can undercount on very high-volume windows.
        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", selector.to_string()),
                ("start", to_ns(start).to_string()),
                ("end", to_ns(end).to_string()),
                ("limit", limit.to_string()),
                ("direction", "BACKWARD".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LokiError::Status {
                code: status.as_u16(),
            });
        }

        match response.json::<QueryRangeResponse>().await {
            Ok(body) => Ok(body),
            // A malformed body is treated as an empty window, not a cycle
            // failure; only transport and status problems escalate.
            Err(e) if e.is_decode() => {
                warn!("Malformed query_range body, treating as empty: {e}");
                Ok(QueryRangeResponse::default())
            }
            Err(e) => Err(e.into()),
        }
    }
}
