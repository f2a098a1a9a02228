//! Catalog file parsing.
//!
//! The catalog source is either a bare JSON array of records or an object
//! wrapping the array under `items` (or, failing that, `majors`).

use campusbot_core::catalog::ProgramRecord;
use campusbot_core::error::KnowledgeError;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::warn;

/// Keys tried, in order, when the catalog is a wrapping object.
pub const CATALOG_LIST_KEYS: [&str; 2] = ["items", "majors"];

/// Read and parse a catalog file.
pub fn read_catalog(path: &Path) -> Result<Vec<ProgramRecord>, KnowledgeError> {
    if !path.exists() {
        return Err(KnowledgeError::NotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path).map_err(|e| KnowledgeError::Read {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_catalog(&raw, path)
}

/// Parse catalog JSON. `path` is only used for error and log context.
pub fn parse_catalog(raw: &str, path: &Path) -> Result<Vec<ProgramRecord>, KnowledgeError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| KnowledgeError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut obj) => CATALOG_LIST_KEYS
            .iter()
            .find_map(|key| match obj.remove(*key) {
                Some(Value::Array(entries)) => Some(entries),
                _ => None,
            })
            .unwrap_or_default(),
        other => {
            return Err(KnowledgeError::Parse {
                path: path.to_path_buf(),
                reason: format!("expected an array or object, found {}", json_kind(&other)),
            });
        }
    };

    let records = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value::<ProgramRecord>(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(file = %path.display(), index, error = %e, "Skipping malformed catalog record");
                None
            }
        })
        .collect();

    Ok(sanitize(records, path))
}

/// Enforce per-snapshot integrity: unique slugs (first wins) and
/// well-ordered tuition bounds.
fn sanitize(records: Vec<ProgramRecord>, path: &Path) -> Vec<ProgramRecord> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());

    for mut record in records {
        if !record.slug.is_empty() && !seen.insert(record.slug.to_lowercase()) {
            warn!(file = %path.display(), slug = %record.slug, "Duplicate catalog slug, keeping first");
            continue;
        }
        if record.tuition_range.is_some_and(|r| !r.is_valid()) {
            warn!(file = %path.display(), slug = %record.slug, "Inverted tuition range dropped");
            record.tuition_range = None;
        }
        kept.push(record);
    }

    kept
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
