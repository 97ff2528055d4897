use std::collections::HashMap;

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Structural failures in an inbound metrics payload. A batch that trips any
/// of these produces zero outbound records.
#[derive(Debug, Error)]
pub enum MalformedBatchError {
    #[error("unsupported metrics payload: {0}")]
    Envelope(#[from] serde_json::Error),
    #[error("batch '{0}' has no datapoints")]
    MissingDatapoints(String),
    #[error("batch '{0}': datapoints is not an array")]
    DatapointsNotAnArray(String),
    #[error("batch '{batch}': datapoint {index} is malformed - {reason}")]
    Datapoint {
        batch: String,
        index: usize,
        reason: String,
    },
}

/// One raw metric event from the monitoring service: a single metric stream
/// for one resource over a time window. Dimension and metadata values are kept
/// as raw JSON since their keys and types are not fixed in advance.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricBatch {
    #[serde(default)]
    pub namespace: String,
    pub resource_group: Option<String>,
    pub compartment_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dimensions: HashMap<String, Value>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    // Validated by the normalizer so a missing/mistyped field can be reported
    // as a MalformedBatchError rather than a bare deserialization failure.
    pub datapoints: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Datapoint {
    pub timestamp: i64,
    pub value: f64,
    /// Sample count reported by the monitoring service; informational only,
    /// never forwarded.
    #[serde(default)]
    pub count: Option<u64>,
}

/// The raw invocation body: either one metric event or a list of them, the
/// two shapes the monitoring service delivers.
#[derive(Debug)]
pub enum MetricsPayload {
    List(Vec<MetricBatch>),
    Single(MetricBatch),
}

impl MetricsPayload {
    pub fn into_batches(self) -> Vec<MetricBatch> {
        match self {
            MetricsPayload::List(batches) => batches,
            MetricsPayload::Single(batch) => vec![batch],
        }
    }
}

impl<'de> Deserialize<'de> for MetricsPayload {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw_value: Value = Deserialize::deserialize(deserializer)?;

        if raw_value.is_array() {
            let batches = Vec::<MetricBatch>::deserialize(&raw_value).map_err(de::Error::custom)?;
            debug!("metric event list detected ({} batches)", batches.len());
            return Ok(MetricsPayload::List(batches));
        }

        if raw_value.is_object() {
            let batch = MetricBatch::deserialize(&raw_value).map_err(de::Error::custom)?;
            debug!("single metric event detected");
            return Ok(MetricsPayload::Single(batch));
        }

        Err(de::Error::custom(format!(
            "unsupported metrics payload: {raw_value}"
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_event_payload() {
        let payload = json!({
            "namespace": "oci_vcn",
            "name": "VnicFromNetworkBytes",
            "dimensions": {"resourceId": "ocid1.vnic.oc1.phx.abc"},
            "metadata": {"displayName": "Bytes from Network", "unit": "bytes"},
            "datapoints": [{"timestamp": 1652196492000i64, "value": 1.25, "count": 1}]
        });

        let batches = serde_json::from_value::<MetricsPayload>(payload)
            .unwrap()
            .into_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].namespace, "oci_vcn");
        assert_eq!(batches[0].name, "VnicFromNetworkBytes");
        assert!(batches[0].resource_group.is_none());
    }

    #[test]
    fn test_event_list_payload() {
        let payload = json!([
            {"namespace": "oci_vcn", "name": "A", "datapoints": []},
            {"namespace": "oci_computeagent", "name": "B", "datapoints": []}
        ]);

        let batches = serde_json::from_value::<MetricsPayload>(payload)
            .unwrap()
            .into_batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].namespace, "oci_computeagent");
    }

    #[test]
    fn test_scalar_payload_is_rejected() {
        let err = serde_json::from_str::<MetricsPayload>("42").unwrap_err();
        assert!(err.to_string().contains("unsupported metrics payload"));
    }

    #[test]
    fn test_datapoint_requires_timestamp_and_value() {
        let dp: Datapoint =
            serde_json::from_value(json!({"timestamp": 1652196492000i64, "value": 0.0})).unwrap();
        assert_eq!(dp.count, None);

        assert!(serde_json::from_value::<Datapoint>(json!({"value": 0.0})).is_err());
        assert!(
            serde_json::from_value::<Datapoint>(json!({"timestamp": 1652196492000i64})).is_err()
        );
    }
}
