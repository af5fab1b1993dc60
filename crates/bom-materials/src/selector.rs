//! Priority-ordered material selection with property fallback.

use std::fmt;
use std::sync::Arc;

use bom_core::{Quantity, Record, Value};
use tracing::{error, warn};

use crate::backend::{BackendDescriptor, BackendRegistry, MaterialBackend};
use crate::error::{MaterialError, MaterialResult};
use crate::record::MaterialRecord;

#[derive(Clone)]
struct Slot {
    descriptor: BackendDescriptor,
    backend: Arc<dyn MaterialBackend>,
}

/// Ordered list of material backends.
///
/// `select` returns the first backend that knows a material. Extraction on the
/// bound material falls back to later backends when a property is missing.
#[derive(Clone, Default)]
pub struct MaterialSelector {
    registry: BackendRegistry,
    order: Vec<Slot>,
}

impl fmt::Debug for MaterialSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaterialSelector")
            .field("registry", &self.registry)
            .field(
                "priority_order",
                &self.order.iter().map(|s| &s.descriptor).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl MaterialSelector {
    /// Empty selector using the built-in backend registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: BackendRegistry) -> Self {
        Self {
            registry,
            order: Vec::new(),
        }
    }

    pub fn registry_mut(&mut self) -> &mut BackendRegistry {
        &mut self.registry
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.order.iter().map(|slot| &slot.descriptor)
    }

    /// Append a backend at the lowest priority, building it from the registry.
    pub fn add_backend(&mut self, descriptor: BackendDescriptor) -> MaterialResult<()> {
        let backend: Arc<dyn MaterialBackend> = Arc::from(self.registry.build(&descriptor)?);
        self.order.push(Slot {
            descriptor,
            backend,
        });
        Ok(())
    }

    /// Append an already-built backend.
    pub fn add_instance(
        &mut self,
        descriptor: BackendDescriptor,
        backend: Arc<dyn MaterialBackend>,
    ) {
        self.order.push(Slot {
            descriptor,
            backend,
        });
    }

    /// Bind `material` to the first backend (in priority order) that contains it.
    pub fn select(&self, material: &str) -> MaterialResult<BoundMaterial> {
        self.select_record(MaterialRecord::new(material))
    }

    /// As [`MaterialSelector::select`], keeping the record's state and fields.
    pub fn select_record(&self, record: MaterialRecord) -> MaterialResult<BoundMaterial> {
        match self.next_containing(&record.name, 0) {
            Some(position) => Ok(self.bind_at(record, position)),
            None => {
                let err = MaterialError::MaterialNotFound {
                    material: record.name.clone(),
                    searched: self.descriptors().map(|d| d.kind().to_string()).collect(),
                };
                error!("{err}");
                Err(err)
            }
        }
    }

    /// Re-attach a record that already names its backend (e.g. read from a skeleton).
    ///
    /// The backend is matched against the priority order; if it is not part of it,
    /// it is built from the registry and fallback starts at the top of the order.
    pub fn bind(&self, record: MaterialRecord) -> MaterialResult<BoundMaterial> {
        let Some(descriptor) = record.backend.clone() else {
            return self.select_record(record);
        };
        if let Some(position) = self.order.iter().position(|s| s.descriptor == descriptor) {
            return Ok(self.bind_at(record, position));
        }
        let backend: Arc<dyn MaterialBackend> = Arc::from(self.registry.build(&descriptor)?);
        Ok(BoundMaterial {
            record,
            backend,
            position: None,
        })
    }

    fn bind_at(&self, mut record: MaterialRecord, position: usize) -> BoundMaterial {
        let slot = &self.order[position];
        record.backend = Some(slot.descriptor.clone());
        BoundMaterial {
            record,
            backend: Arc::clone(&slot.backend),
            position: Some(position),
        }
    }

    fn next_containing(&self, material: &str, from: usize) -> Option<usize> {
        (from..self.order.len()).find(|&i| self.order[i].backend.contains(material))
    }

    /// `{priority_order: [{class_str, data}, ...]}`.
    pub fn to_value(&self) -> Value {
        let order = self.descriptors().map(BackendDescriptor::to_value).collect();
        let mut out = Record::new();
        out.insert("priority_order".to_string(), Value::Array(order));
        Value::Object(out)
    }

    /// Read either the current persisted form or the legacy keyed form:
    /// `{order: {"0": name, ...}, name: {class_str: [kind], <args>...}}`.
    pub fn from_value(value: &Value, registry: BackendRegistry) -> MaterialResult<Self> {
        let mut selector = Self::with_registry(registry);
        if let Some(order) = value.get("priority_order") {
            let entries = order.as_array().ok_or_else(|| MaterialError::InvalidArgs {
                backend: "selector".to_string(),
                what: "'priority_order' must be a list".to_string(),
            })?;
            for entry in entries {
                selector.add_backend(BackendDescriptor::from_value(entry)?)?;
            }
        } else if value.get("order").is_some() {
            selector.load_legacy(value)?;
        }
        Ok(selector)
    }

    fn load_legacy(&mut self, value: &Value) -> MaterialResult<()> {
        let invalid = |what: String| MaterialError::InvalidArgs {
            backend: "selector".to_string(),
            what,
        };
        let order = value
            .get("order")
            .and_then(Value::as_object)
            .ok_or_else(|| invalid("'order' must be a mapping".to_string()))?;

        for i in 0..order.len() {
            let name = order
                .get(&i.to_string())
                .and_then(Value::as_str)
                .ok_or_else(|| invalid(format!("'order' has no entry {i}")))?;
            let mut data = value
                .get(name)
                .and_then(Value::as_object)
                .cloned()
                .ok_or_else(|| invalid(format!("no database named '{name}'")))?;

            let class_str: Vec<String> = match data.remove("class_str") {
                Some(Value::Array(items)) => items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
                Some(Value::String(s)) => vec![s],
                _ => Vec::new(),
            };
            if class_str.len() != 1 {
                let msg = "material class string has more than one component".to_string();
                error!("{msg}");
                return Err(invalid(msg));
            }
            self.add_backend(BackendDescriptor { class_str, data })?;
        }
        Ok(())
    }
}

/// A material record bound to the backend that will answer property queries.
#[derive(Clone)]
pub struct BoundMaterial {
    record: MaterialRecord,
    backend: Arc<dyn MaterialBackend>,
    /// Index in the selector's priority order, if the backend is part of it.
    position: Option<usize>,
}

impl fmt::Debug for BoundMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMaterial")
            .field("record", &self.record)
            .field("backend", &self.backend.kind())
            .field("position", &self.position)
            .finish()
    }
}

impl BoundMaterial {
    pub fn record(&self) -> &MaterialRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut MaterialRecord {
        &mut self.record
    }

    pub fn into_record(self) -> MaterialRecord {
        self.record
    }

    pub fn backend_kind(&self) -> &str {
        self.backend.kind()
    }

    /// Extract a property, falling back along the selector's priority order.
    ///
    /// On `DataAbsent` the next backend that contains the material is bound with
    /// this record's temperature, pressure and irradiation and asked in turn.
    /// Other errors are returned as-is.
    pub fn extract(&self, property: &str, selector: &MaterialSelector) -> MaterialResult<Quantity> {
        let mut record = self.record.clone();
        let mut backend = Arc::clone(&self.backend);
        let mut next_from = self.position.map_or(0, |p| p + 1);

        loop {
            match backend.extract(&record, property) {
                Err(MaterialError::DataAbsent { reason, .. }) => {
                    warn!(
                        "{} {} not in {}: {}",
                        record.name,
                        property,
                        backend.kind(),
                        reason
                    );
                    let Some(position) = selector.next_containing(&record.name, next_from) else {
                        let err = MaterialError::PropertyNotFound {
                            material: record.name.clone(),
                            property: property.to_string(),
                        };
                        error!("{err}");
                        return Err(err);
                    };
                    let rebound = selector.bind_at(MaterialRecord::new(record.name.clone()), position);
                    let mut next_record = rebound.record;
                    next_record.copy_state_from(&record);
                    record = next_record;
                    backend = rebound.backend;
                    next_from = position + 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBackend;
    use bom_core::units::k;
    use serde_json::json;

    fn table(value: Value) -> BackendDescriptor {
        let mut args = Record::new();
        args.insert("table".into(), value);
        BackendDescriptor::new(TableBackend::KIND, args)
    }

    fn two_tables() -> MaterialSelector {
        let mut selector = MaterialSelector::new();
        selector
            .add_backend(table(json!({"Steel": {"density": null}, "Copper": {"density": 8960}})))
            .unwrap();
        selector
            .add_backend(table(json!({
                "Steel": {"density": 7800, "mass": 100},
                "units": {"density": "kg/m^3", "mass": "kg"}
            })))
            .unwrap();
        selector
    }

    #[test]
    fn select_first_backend_containing_material() {
        let selector = two_tables();
        let bound = selector.select("Steel").unwrap();
        assert_eq!(bound.position, Some(0));
        assert_eq!(
            bound.record().backend.as_ref().map(|d| d.kind()),
            Some("table")
        );
    }

    #[test]
    fn missing_material() {
        let selector = two_tables();
        assert!(matches!(
            selector.select("Unobtainium"),
            Err(MaterialError::MaterialNotFound { .. })
        ));
    }

    #[test]
    fn property_falls_back_to_next_backend() {
        let selector = two_tables();
        let bound = selector.select("Steel").unwrap();
        assert_eq!(
            bound.extract("mass", &selector).unwrap(),
            Quantity::new(100.0, "kg")
        );
        assert_eq!(bound.extract("density", &selector).unwrap().value, 7800.0);
    }

    #[test]
    fn fallback_exhaustion() {
        let selector = two_tables();
        let bound = selector.select("Steel").unwrap();
        assert!(matches!(
            bound.extract("hardness", &selector),
            Err(MaterialError::PropertyNotFound { .. })
        ));
    }

    #[test]
    fn state_travels_with_fallback() {
        struct EchoTemperature;
        impl MaterialBackend for EchoTemperature {
            fn kind(&self) -> &str {
                "echo"
            }
            fn contains(&self, _material: &str) -> bool {
                true
            }
            fn extract(&self, record: &MaterialRecord, _property: &str) -> MaterialResult<Quantity> {
                Ok(Quantity::new(record.temperature_k(), "K"))
            }
        }

        let mut selector = two_tables();
        selector.add_instance(BackendDescriptor::new("echo", Record::new()), Arc::new(EchoTemperature));

        let mut bound = selector.select("Steel").unwrap();
        bound.record_mut().temperature = k(600.0);
        assert_eq!(bound.extract("temperature", &selector).unwrap().value, 600.0);
    }

    #[test]
    fn persisted_form_round_trip() {
        let selector = two_tables();
        let value = selector.to_value();
        assert_eq!(value["priority_order"].as_array().map(Vec::len), Some(2));
        let back = MaterialSelector::from_value(&value, BackendRegistry::with_builtins()).unwrap();
        assert_eq!(back.to_value(), value);
    }

    #[test]
    fn legacy_form() {
        let value = json!({
            "order": {"0": "inhouse", "1": "fluids"},
            "inhouse": {"class_str": ["table"], "table": {"Steel": {"density": 7800}}},
            "fluids": {"class_str": ["bom_analysis.materials.CoolPropsWrap"]}
        });
        let selector = MaterialSelector::from_value(&value, BackendRegistry::with_builtins()).unwrap();
        let kinds: Vec<&str> = selector.descriptors().map(|d| d.kind()).collect();
        assert_eq!(kinds, vec!["table", "CoolPropsWrap"]);

        let bad = json!({
            "order": {"0": "inhouse"},
            "inhouse": {"class_str": ["table", "coolprop"]}
        });
        assert!(MaterialSelector::from_value(&bad, BackendRegistry::with_builtins()).is_err());
    }

    #[test]
    fn bind_uses_recorded_backend() {
        let selector = two_tables();
        let mut record = MaterialRecord::new("Steel");
        record.backend = selector.descriptors().nth(1).cloned();
        let bound = selector.bind(record).unwrap();
        assert_eq!(bound.position, Some(1));
    }
}
