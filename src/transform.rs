use serde::Deserialize;
use tracing::debug;

use crate::events::{Datapoint, MalformedBatchError, MetricBatch};
use crate::moogsoft::MetricRecord;
use crate::{source, tags};

/// Expands one metric batch into outbound records, one per datapoint,
/// preserving datapoint order.
///
/// The batch-level fields (`metric`, `source`, `tags`) are synthesized once
/// and broadcast to every record; each record carries its own datapoint's
/// timestamp and value. Datapoint values are not range-checked.
pub fn normalize(
    batch: &MetricBatch,
    tag_keys: &[String],
) -> Result<impl Iterator<Item = MetricRecord>, MalformedBatchError> {
    let datapoints = validated_datapoints(batch)?;
    let metric = metric_title(batch);
    let source = source::source_name(&batch.namespace, &batch.name);
    let tags = tags::synthesize(batch, tag_keys);

    debug!(
        datapoints = datapoints.len(),
        source = %source,
        tag_count = tags.len(),
        "normalized metric batch"
    );

    Ok(datapoints.into_iter().map(move |datapoint| MetricRecord {
        metric: metric.clone(),
        source: source.clone(),
        time: datapoint.timestamp,
        data: datapoint.value,
        tags: tags.clone(),
    }))
}

/// The outbound metric title: the batch's displayName where one is present,
/// falling back to the metric short name.
pub fn metric_title(batch: &MetricBatch) -> String {
    tags::lookup(batch, "displayName").unwrap_or_else(|| batch.name.clone())
}

fn validated_datapoints(batch: &MetricBatch) -> Result<Vec<Datapoint>, MalformedBatchError> {
    let raw = batch
        .datapoints
        .as_ref()
        .ok_or_else(|| MalformedBatchError::MissingDatapoints(batch.name.clone()))?;
    let entries = raw
        .as_array()
        .ok_or_else(|| MalformedBatchError::DatapointsNotAnArray(batch.name.clone()))?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            Datapoint::deserialize(entry).map_err(|e| MalformedBatchError::Datapoint {
                batch: batch.name.clone(),
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}
