use serde_json::Value;

use crate::events::MetricBatch;

/// Renders the configured tag keys as flat `"key:value"` strings.
///
/// Keys are resolved in configured order; a key absent from every lookup
/// source is skipped rather than emitted empty, so the tag count is at most
/// the configured key count. Values are forwarded as-is, embedded colons and
/// whitespace included.
pub fn synthesize(batch: &MetricBatch, tag_keys: &[String]) -> Vec<String> {
    tag_keys
        .iter()
        .filter_map(|key| lookup(batch, key).map(|value| format!("{}:{}", key, value)))
        .collect()
}

/// Resolves a key against the batch's metadata, then its dimensions, then its
/// top-level fields, returning the first hit.
pub fn lookup(batch: &MetricBatch, key: &str) -> Option<String> {
    batch
        .metadata
        .get(key)
        .and_then(stringify)
        .or_else(|| batch.dimensions.get(key).and_then(stringify))
        .or_else(|| top_level_field(batch, key))
}

fn top_level_field(batch: &MetricBatch, key: &str) -> Option<String> {
    match key {
        "name" => Some(batch.name.clone()),
        "namespace" => Some(batch.namespace.clone()),
        "resourceGroup" => batch.resource_group.clone(),
        "compartmentId" => batch.compartment_id.clone(),
        _ => None,
    }
}

// JSON strings pass through untouched and null counts as absent; any other
// value is rendered with its compact JSON encoding.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
