//! Backend contract and the registry of named backend factories.

use std::collections::BTreeMap;
use std::fmt;

use bom_core::{Quantity, Record, Value};
use serde::{Deserialize, Serialize};

use crate::coolprop::CoolPropBackend;
use crate::error::{MaterialError, MaterialResult};
use crate::record::MaterialRecord;
use crate::table::TableBackend;

/// A source of physical-property data for named materials.
///
/// Implementations must be thread-safe (Send + Sync) so a selector can be
/// shared between graphs.
pub trait MaterialBackend: Send + Sync {
    /// Backend kind, as registered in the [`BackendRegistry`].
    fn kind(&self) -> &str;

    /// Whether this backend knows the material at all.
    fn contains(&self, material: &str) -> bool;

    /// Look up `property` for the record's material at the record's state.
    ///
    /// Must return [`MaterialError::DataAbsent`] when the material is known but
    /// the property is not, so the selector can fall back.
    fn extract(&self, record: &MaterialRecord, property: &str) -> MaterialResult<Quantity>;
}

/// Backend type plus its fixed arguments.
///
/// Persisted as `{class_str: [kind], data: {...}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub class_str: Vec<String>,
    #[serde(default)]
    pub data: Record,
}

impl BackendDescriptor {
    pub fn new(kind: impl Into<String>, args: Record) -> Self {
        Self {
            class_str: vec![kind.into()],
            data: args,
        }
    }

    /// The backend kind: last dotted segment of the first class string.
    pub fn kind(&self) -> &str {
        self.class_str
            .first()
            .map(|class_str| class_str.rsplit('.').next().unwrap_or(class_str.as_str()))
            .unwrap_or_default()
    }

    pub fn from_value(value: &Value) -> MaterialResult<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn to_value(&self) -> Value {
        let mut out = Record::new();
        out.insert(
            "class_str".to_string(),
            Value::Array(self.class_str.iter().cloned().map(Value::String).collect()),
        );
        out.insert("data".to_string(), Value::Object(self.data.clone()));
        Value::Object(out)
    }
}

impl fmt::Display for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// Builds a backend from its fixed arguments.
pub type BackendFactory = fn(&Record) -> MaterialResult<Box<dyn MaterialBackend>>;

/// Named backend factories. Replaces dynamic class lookup by name.
#[derive(Clone)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn table_factory(args: &Record) -> MaterialResult<Box<dyn MaterialBackend>> {
    Ok(Box::new(TableBackend::from_args(args)?))
}

fn coolprop_factory(args: &Record) -> MaterialResult<Box<dyn MaterialBackend>> {
    Ok(Box::new(CoolPropBackend::from_args(args)?))
}

impl BackendRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// `table` and `coolprop`, plus the legacy names `DFLibraryWrap` and `CoolPropsWrap`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(TableBackend::KIND, table_factory);
        registry.register("DFLibraryWrap", table_factory);
        registry.register(CoolPropBackend::KIND, coolprop_factory);
        registry.register("CoolPropsWrap", coolprop_factory);
        registry
    }

    pub fn register(&mut self, kind: impl Into<String>, factory: BackendFactory) {
        self.factories.insert(kind.into(), factory);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn build(&self, descriptor: &BackendDescriptor) -> MaterialResult<Box<dyn MaterialBackend>> {
        let kind = descriptor.kind();
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| MaterialError::UnknownBackend {
                class_str: descriptor.class_str.join(", "),
            })?;
        factory(&descriptor.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_kind_strips_module_path() {
        let descriptor = BackendDescriptor::from_value(&json!({
            "class_str": ["bom_analysis.materials.CoolPropsWrap"],
            "data": {}
        }))
        .unwrap();
        assert_eq!(descriptor.kind(), "CoolPropsWrap");
        assert!(BackendRegistry::with_builtins().contains(descriptor.kind()));
    }

    #[test]
    fn descriptor_persisted_form() {
        let descriptor = BackendDescriptor::new("table", Record::new());
        assert_eq!(
            descriptor.to_value(),
            json!({"class_str": ["table"], "data": {}})
        );
        assert_eq!(
            BackendDescriptor::from_value(&descriptor.to_value()).unwrap(),
            descriptor
        );
    }

    #[test]
    fn unknown_backend() {
        let registry = BackendRegistry::with_builtins();
        let err = registry
            .build(&BackendDescriptor::new("asme", Record::new()))
            .err()
            .unwrap();
        assert!(matches!(err, MaterialError::UnknownBackend { .. }));
    }
}
