use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// One MoogSoft-ingestible metric datum, as posted to the ingestion API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub metric: String,
    pub source: String,
    pub time: i64,
    pub data: f64,
    pub tags: Vec<String>,
}

/// A record that could not be delivered, together with why. Delivery is
/// attempted at most once per record; retries are the caller's concern.
#[derive(Debug, Error)]
#[error("failed to deliver metric '{}' at {}: {kind}", .record.source, .record.time)]
pub struct DeliveryError {
    pub record: MetricRecord,
    #[source]
    pub kind: DeliveryErrorKind,
}

#[derive(Debug, Error)]
pub enum DeliveryErrorKind {
    #[error("endpoint returned {0}")]
    Status(StatusCode),
    #[error("network error - {0}")]
    Network(#[from] reqwest::Error),
}

#[async_trait]
pub trait MetricsExporter {
    async fn export(&self, record: MetricRecord) -> Result<(), DeliveryError>;
}

pub type DynMetricsExporter = Arc<dyn MetricsExporter + Send + Sync>;

/// Ships records to the MoogSoft REST ingestion endpoint over a pooled HTTPS
/// client, one POST per record.
pub struct RestMetricsExporter {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
}

impl RestMetricsExporter {
    pub fn new(client: reqwest::Client, endpoint: String, api_token: String) -> Self {
        RestMetricsExporter {
            client,
            endpoint,
            api_token,
        }
    }
}

#[async_trait]
impl MetricsExporter for RestMetricsExporter {
    async fn export(&self, record: MetricRecord) -> Result<(), DeliveryError> {
        debug!(
            "json to MoogSoft: {}",
            serde_json::to_string(&record).unwrap_or_default()
        );

        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header("apiKey", &self.api_token)
            .json(&record)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                info!(
                    status = %response.status(),
                    source = %record.source,
                    elapsed_ms = start.elapsed().as_millis(),
                    "metric record delivered"
                );
                Ok(())
            }
            Ok(response) => Err(DeliveryError {
                record,
                kind: DeliveryErrorKind::Status(response.status()),
            }),
            Err(error) => Err(DeliveryError {
                record,
                kind: DeliveryErrorKind::Network(error),
            }),
        }
    }
}
