//! Template catalogs and skeletons.

use std::collections::BTreeMap;
use std::path::Path;

use bom_core::{Record, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{is_yaml, load_and_merge};
use crate::{SkeletonError, SkeletonResult};

/// Records keyed by name: part templates by type, storage templates, parameter sets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: BTreeMap<String, Record>,
}

/// Parameter sets referenced by `params_name`, keyed by set name.
pub type ParameterSets = Catalog;

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every top-level value must be a mapping.
    pub fn from_record(record: Record) -> SkeletonResult<Self> {
        let mut entries = BTreeMap::new();
        for (name, value) in record {
            match value {
                Value::Object(template) => {
                    entries.insert(name, template);
                }
                other => {
                    return Err(SkeletonError::InvalidDocument {
                        what: format!("catalog entry '{name}' must be a mapping, got {other}"),
                    });
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn from_value(value: &Value) -> SkeletonResult<Self> {
        match value {
            Value::Object(record) => Self::from_record(record.clone()),
            Value::Null => Ok(Self::new()),
            other => Err(SkeletonError::InvalidDocument {
                what: format!("catalog must be a mapping, got {other}"),
            }),
        }
    }

    /// Load and deep-merge catalog files.
    pub fn load(paths: &[impl AsRef<Path>]) -> SkeletonResult<Self> {
        Self::from_record(load_and_merge(paths)?)
    }

    pub fn get(&self, name: &str) -> Option<&Record> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Record> {
        self.entries.get_mut(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, template: Record) {
        self.entries.insert(name.into(), template);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Record)> {
        self.entries.iter()
    }

    /// Merge another catalog on top of this one.
    pub fn extend_merged(&mut self, other: &Catalog) {
        for (name, template) in &other.entries {
            let entry = self.entries.entry(name.clone()).or_default();
            crate::merge::merge_records(entry, template);
        }
    }
}

/// Flat description of a whole assembly graph: reference -> resolved record.
///
/// Ordered by reference, so serialization is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Skeleton {
    records: BTreeMap<String, Record>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a flat reference -> record mapping. A legacy `_META` entry is dropped.
    pub fn from_value(value: &Value) -> SkeletonResult<Self> {
        let Value::Object(map) = value else {
            return Err(SkeletonError::InvalidDocument {
                what: "skeleton must be a mapping of reference to record".to_string(),
            });
        };
        let mut records = BTreeMap::new();
        for (reference, record) in map {
            if reference == "_META" {
                debug!("dropping legacy _META entry from skeleton");
                continue;
            }
            let Value::Object(record) = record else {
                return Err(SkeletonError::InvalidDocument {
                    what: format!("skeleton record '{reference}' must be a mapping"),
                });
            };
            records.insert(reference.clone(), record.clone());
        }
        Ok(Self { records })
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.records
                .iter()
                .map(|(reference, record)| (reference.clone(), Value::Object(record.clone())))
                .collect(),
        )
    }

    pub fn get(&self, reference: &str) -> Option<&Record> {
        self.records.get(reference)
    }

    pub fn get_mut(&mut self, reference: &str) -> Option<&mut Record> {
        self.records.get_mut(reference)
    }

    pub fn insert(&mut self, reference: impl Into<String>, record: Record) -> Option<Record> {
        self.records.insert(reference.into(), record)
    }

    pub fn remove(&mut self, reference: &str) -> Option<Record> {
        self.records.remove(reference)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.records.contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn refs(&self) -> impl Iterator<Item = &String> {
        self.records.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Record)> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Record)> {
        self.records.iter_mut()
    }

    /// The `type` of a record, if it has one.
    pub fn type_of(&self, reference: &str) -> Option<&str> {
        self.records
            .get(reference)
            .and_then(|record| record.get("type"))
            .and_then(Value::as_str)
    }

    pub fn load(path: &Path) -> SkeletonResult<Self> {
        Self::from_value(&crate::document::load_document(path)?)
    }

    /// Write as YAML for `.yaml`/`.yml` paths, pretty JSON otherwise.
    pub fn save(&self, path: &Path) -> SkeletonResult<()> {
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_rejects_scalars() {
        let err = Catalog::from_value(&json!({"car": 3})).unwrap_err();
        assert!(matches!(err, SkeletonError::InvalidDocument { .. }));
    }

    #[test]
    fn catalog_extend_merges_templates() {
        let mut base = Catalog::from_value(&json!({"car": {"wheels": 4, "tags": ["a"]}})).unwrap();
        let patch = Catalog::from_value(&json!({"car": {"tags": ["b"]}, "bike": {}})).unwrap();
        base.extend_merged(&patch);
        assert_eq!(base.get("car").unwrap()["tags"], json!(["a", "b"]));
        assert!(base.contains("bike"));
    }

    #[test]
    fn skeleton_drops_meta() {
        let skeleton = Skeleton::from_value(&json!({
            "_META": {"ref": "mycar", "type": "car"},
            "mycar": {"type": "car"}
        }))
        .unwrap();
        assert_eq!(skeleton.len(), 1);
        assert_eq!(skeleton.type_of("mycar"), Some("car"));
    }

    #[test]
    fn skeleton_save_and_load() {
        let skeleton = Skeleton::from_value(&json!({"mycar": {"type": "car", "colour": "red"}})).unwrap();
        for name in ["bom_skeleton_save.json", "bom_skeleton_save.yaml"] {
            let path = std::env::temp_dir().join(name);
            skeleton.save(&path).unwrap();
            assert_eq!(Skeleton::load(&path).unwrap(), skeleton);
            let _ = std::fs::remove_file(&path);
        }
    }
}
