//! Loading JSON/YAML documents.

use std::path::{Path, PathBuf};

use bom_core::{Record, Value};
use tracing::debug;

use crate::merge::merge_records;
use crate::{SkeletonError, SkeletonResult};

pub(crate) fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

/// Read a document, as YAML for `.yaml`/`.yml` and as JSON otherwise.
pub fn load_document(path: &Path) -> SkeletonResult<Value> {
    let content = std::fs::read_to_string(path)?;
    let value = if is_yaml(path) {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    debug!(path = %path.display(), "loaded document");
    Ok(value)
}

/// Load each document (duplicates skipped) and deep-merge them in order.
pub fn load_and_merge(paths: &[impl AsRef<Path>]) -> SkeletonResult<Record> {
    let mut seen: Vec<PathBuf> = Vec::new();
    let mut merged = Record::new();
    for path in paths {
        let path = path.as_ref();
        if seen.iter().any(|p| p == path) {
            continue;
        }
        seen.push(path.to_path_buf());
        match load_document(path)? {
            Value::Object(record) => merge_records(&mut merged, &record),
            Value::Null => {}
            _ => {
                return Err(SkeletonError::InvalidDocument {
                    what: format!("{} must contain a mapping", path.display()),
                });
            }
        }
    }
    Ok(merged)
}
