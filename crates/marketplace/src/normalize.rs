//! Defensive parsing of marketplace payloads.
//!
//! The upstream schema has changed shape more than once, so nothing here
//! assumes a fixed layout: unknown envelopes yield zero records and records
//! missing an identity are dropped.

use {serde_json::Value, tracing::debug};

use crate::types::MarketplaceRecord;

/// Fields that may wrap the record array in an object envelope.
const ENVELOPE_FIELDS: &[&str] = &["skills", "results", "data"];

/// Normalize any supported envelope into records.
pub fn normalize_records(value: Value) -> Vec<MarketplaceRecord> {
    let Some(items) = extract_array(value) else {
        debug!("unrecognized marketplace envelope, treating as empty");
        return Vec::new();
    };
    let total = items.len();
    let records: Vec<_> = items.iter().filter_map(normalize_record).collect();
    if records.len() < total {
        debug!(
            dropped = total - records.len(),
            "dropped marketplace records without identity"
        );
    }
    records
}

fn extract_array(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => ENVELOPE_FIELDS
            .iter()
            .find_map(|field| match map.remove(*field) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            }),
        _ => None,
    }
}

fn normalize_record(value: &Value) -> Option<MarketplaceRecord> {
    let obj = value.as_object()?;
    let text = |keys: &[&str]| -> Option<String> {
        keys.iter().find_map(|k| match obj.get(*k)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    };

    let name = text(&["name"]);
    let skill_id = text(&["skillId", "skill_id"]).or_else(|| name.clone())?;
    let name = name.unwrap_or_else(|| skill_id.clone());
    let source = text(&["source", "topSource", "repo"]).unwrap_or_default();
    let id = match text(&["id"]) {
        Some(id) => id,
        None if !source.is_empty() => MarketplaceRecord::synthetic_id(&source, &skill_id),
        None => return None,
    };
    let install_count = ["installs", "installCount", "install_count"]
        .iter()
        .find_map(|k| match obj.get(*k)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(0);

    Some(MarketplaceRecord {
        id,
        skill_id,
        name,
        install_count,
        source,
    })
}
