use futures::stream::StreamExt;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::events::{MalformedBatchError, MetricsPayload};
use crate::moogsoft::{DynMetricsExporter, MetricRecord};
use crate::transform;
use crate::Error;

/// What one invocation produced: every transformed record plus how many of
/// them were actually delivered to the endpoint.
#[derive(Debug)]
pub struct InvocationReport {
    pub records: Vec<MetricRecord>,
    pub delivered: usize,
}

/// Runs one raw metrics payload through the full transform-and-forward path.
///
/// The whole payload is normalized before anything is dispatched, so a
/// malformed batch aborts the invocation with zero records sent. A failed
/// delivery does not stop the remaining records; every failure is logged and
/// the first one is surfaced once the batch has drained.
pub async fn metrics(
    exporter: DynMetricsExporter,
    config: &Config,
    payload: &[u8],
) -> Result<InvocationReport, Error> {
    let payload: MetricsPayload =
        serde_json::from_slice(payload).map_err(MalformedBatchError::from)?;
    let batches = payload.into_batches();

    info!(
        "event count = {} / logging level = {} / forwarding to MoogSoft = {}",
        batches.len(),
        config.logging_level,
        config.forwarding_enabled
    );

    let mut records: Vec<MetricRecord> = Vec::new();
    for batch in &batches {
        records.extend(transform::normalize(batch, &config.tag_keys)?);
    }

    if !config.forwarding_enabled {
        info!(
            "MoogSoft forwarding is disabled - {} records transformed, nothing sent",
            records.len()
        );
        debug!(
            "{}",
            serde_json::to_string_pretty(&records).unwrap_or_default()
        );
        return Ok(InvocationReport {
            records,
            delivered: 0,
        });
    }

    // Dispatch records concurrently, but not more than 5 simultaneously. Each
    // record is fully assembled before its POST goes out.
    let results = futures::stream::iter(records.clone())
        .map(|record| {
            let exporter = exporter.clone();
            async move { exporter.export(record).await }
        })
        .buffer_unordered(5)
        .collect::<Vec<_>>()
        .await;

    let mut delivered = 0;
    let mut first_failure = None;
    for result in results {
        match result {
            Ok(()) => delivered += 1,
            Err(failure) => {
                error!(?failure, "failed to deliver metric record");
                if first_failure.is_none() {
                    first_failure = Some(failure);
                }
            }
        }
    }

    info!(
        "delivered {} of {} metric records to MoogSoft",
        delivered,
        records.len()
    );

    if let Some(failure) = first_failure {
        return Err(failure.into());
    }

    Ok(InvocationReport { records, delivered })
}
