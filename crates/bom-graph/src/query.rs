//! Lookups and bulk updates over a graph.

use std::collections::BTreeMap;
use std::fmt::Write;

use bom_core::{NodeId, Record, Value};
use bom_materials::{BoundMaterial, MaterialRecord, MaterialSelector};
use bom_skeleton::deep_merge;
use tracing::debug;

use crate::bom::Bom;
use crate::error::{GraphError, GraphResult};

/// Reference -> (name -> value) for every node reached.
pub type Lookup = BTreeMap<String, BTreeMap<String, Value>>;

impl Bom {
    /// Literal fields of every node reachable from `id`; absent fields are null.
    pub fn lookup(&self, id: NodeId, names: &[&str]) -> GraphResult<Lookup> {
        let mut out = Lookup::new();
        for (reference, node_id) in self.flatten(id)? {
            let node = self.get(node_id)?;
            let values = names
                .iter()
                .map(|&name| {
                    let value = match name {
                        "ref" => Value::String(node.reference.clone()),
                        _ => node.field(name).cloned().unwrap_or(Value::Null),
                    };
                    (name.to_string(), value)
                })
                .collect();
            out.insert(reference, values);
        }
        Ok(out)
    }

    /// Parameter values of every node reachable from `id`; absent parameters are null.
    pub fn lookup_params(&self, id: NodeId, vars: &[&str]) -> GraphResult<Lookup> {
        let mut out = Lookup::new();
        for (reference, node_id) in self.flatten(id)? {
            let params = &self.get(node_id)?.params;
            let values = vars
                .iter()
                .map(|&var| {
                    let value = params.get(var).cloned().unwrap_or(Value::Null);
                    (var.to_string(), value)
                })
                .collect();
            out.insert(reference, values);
        }
        Ok(out)
    }

    /// Follow a dotted path of child references (`"car.engine.piston"`).
    ///
    /// The root's own reference may lead the path.
    pub fn component_from_path(&self, root: NodeId, path: &str) -> GraphResult<NodeId> {
        let node = self.get(root)?;
        let mut parts: Vec<&str> = path.split('.').filter(|part| !part.is_empty()).collect();
        if parts.first() == Some(&node.reference.as_str()) && !node.children.contains_key(parts[0]) {
            parts.remove(0);
        }

        let mut current = root;
        for part in parts {
            let node = self.get(current)?;
            current = *node
                .children
                .get(part)
                .ok_or_else(|| GraphError::UnknownReference {
                    reference: part.to_string(),
                    parent: node.reference.clone(),
                })?;
        }
        Ok(current)
    }

    /// Apply `reference -> defaults` to the nodes reachable from `root`.
    ///
    /// A `material` entry is merged into the node's material record; the rest goes
    /// to the parameter frame in any layout the frame accepts. Unknown references
    /// are skipped.
    pub fn add_defaults(&mut self, root: NodeId, defaults: &Record) -> GraphResult<()> {
        let flat = self.flatten(root)?;
        for (reference, value) in defaults {
            let Some(&id) = flat.get(reference) else {
                debug!(reference, "no node for defaults");
                continue;
            };
            let mut value = value.clone();
            let material = match &mut value {
                Value::Object(entry) => entry.remove("material"),
                _ => None,
            };
            let node = self.get_mut(id)?;
            if let Some(material) = material {
                let mut current = match &node.material {
                    Some(record) => record.to_value()?,
                    None => Value::Object(Record::new()),
                };
                deep_merge(&mut current, &material);
                node.material = Some(MaterialRecord::from_value(&current)?);
            }
            node.params.add_defaults(&value)?;
        }
        Ok(())
    }

    /// Rebind every named material reachable from `root` through the selector.
    ///
    /// Temperature, pressure, irradiation and extra fields are kept.
    pub fn assign_all_materials(
        &mut self,
        root: NodeId,
        selector: &MaterialSelector,
    ) -> GraphResult<()> {
        for id in self.flatten(root)?.into_values() {
            let node = self.get_mut(id)?;
            let Some(current) = node.material.as_ref().filter(|m| !m.name.is_empty()) else {
                continue;
            };
            let mut record = selector.select(&current.name)?.into_record();
            record.copy_state_from(current);
            record.extra = current.extra.clone();
            node.material = Some(record);
        }
        Ok(())
    }

    /// The node's material, bound for property extraction.
    pub fn bind_material(
        &self,
        id: NodeId,
        selector: &MaterialSelector,
    ) -> GraphResult<Option<BoundMaterial>> {
        match &self.get(id)?.material {
            Some(record) if !record.name.is_empty() => Ok(Some(selector.bind(record.clone())?)),
            _ => Ok(None),
        }
    }

    /// Indented tree of references below `root`.
    pub fn hierarchy(&self, root: NodeId) -> GraphResult<String> {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.get(root)?.reference);
        self.write_branch(root, "", &mut out)?;
        Ok(out)
    }

    fn write_branch(&self, id: NodeId, prefix: &str, out: &mut String) -> GraphResult<()> {
        let children = &self.get(id)?.children;
        let last = children.len().saturating_sub(1);
        for (i, (reference, &child)) in children.iter().enumerate() {
            let (branch, indent) = if i == last {
                ("└── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            let count = self.get(id)?.count_ref(reference);
            if count > 1 {
                let _ = writeln!(out, "{prefix}{branch}{reference} x{count}");
            } else {
                let _ = writeln!(out, "{prefix}{branch}{reference}");
            }
            self.write_branch(child, &format!("{prefix}{indent}"), out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bom_materials::{BackendDescriptor, MaterialRecord};
    use serde_json::json;

    fn car() -> (Bom, NodeId) {
        let mut bom = Bom::default();
        let car = bom.add_assembly("car");
        let engine = bom.add_assembly("engine");
        let piston = bom.add_component("piston");
        let seat = bom.add_component("seat");
        bom.attach(engine, piston, None).unwrap();
        for _ in 0..4 {
            bom.attach(engine, piston, None).unwrap();
        }
        bom.attach(car, engine, None).unwrap();
        bom.attach(car, seat, None).unwrap();
        (bom, car)
    }

    #[test]
    fn dotted_paths() {
        let (bom, car) = car();
        let piston = bom.component_from_path(car, "car.engine.piston").unwrap();
        assert_eq!(bom.node(piston).unwrap().reference(), "piston");
        assert_eq!(bom.component_from_path(car, "engine.piston").unwrap(), piston);
        assert_eq!(bom.component_from_path(car, "car").unwrap(), car);
        assert!(matches!(
            bom.component_from_path(car, "engine.crank"),
            Err(GraphError::UnknownReference { reference, parent }) if reference == "crank" && parent == "engine"
        ));
    }

    #[test]
    fn renders_hierarchy() {
        let (bom, car) = car();
        assert_eq!(
            bom.hierarchy(car).unwrap(),
            "car\n├── engine\n│   └── piston x5\n└── seat\n"
        );
    }

    #[test]
    fn lookups_cover_the_graph() {
        let (mut bom, car) = car();
        let seat = bom.resolve(car, "seat").unwrap().unwrap();
        bom.node_mut(seat).unwrap().insert_field("colour", "red");
        bom.node_mut(seat)
            .unwrap()
            .params_mut()
            .set("mass", json!("12 kg"))
            .unwrap();

        let fields = bom.lookup(car, &["colour"]).unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields["seat"]["colour"], json!("red"));
        assert_eq!(fields["piston"]["colour"], Value::Null);

        let params = bom.lookup_params(car, &["mass"]).unwrap();
        assert_eq!(params["seat"]["mass"], json!(12.0));
        assert_eq!(params["engine"]["mass"], Value::Null);
    }

    #[test]
    fn defaults_reach_params_and_material() {
        let (mut bom, car) = car();
        let defaults = json!({
            "seat": {"mass": 12, "material": {"name": "Leather", "temperature": 300.0}},
            "piston": {"params": {"data": {"bore": {"var": "bore", "value": 0.08, "unit": "m"}}}},
            "radio": {"mass": 1}
        });
        bom.add_defaults(car, defaults.as_object().unwrap()).unwrap();

        let seat = bom.node(bom.resolve(car, "seat").unwrap().unwrap()).unwrap();
        assert_eq!(seat.params().get("mass").unwrap(), &json!(12));
        let material = seat.material().unwrap();
        assert_eq!(material.name, "Leather");
        assert_eq!(material.temperature_k(), 300.0);

        let piston = bom.node(bom.resolve(car, "piston").unwrap().unwrap()).unwrap();
        assert_eq!(piston.params().param("bore").unwrap().unit.as_deref(), Some("m"));
    }

    #[test]
    fn materials_rebind_keeping_state() {
        let (mut bom, car) = car();
        let seat = bom.resolve(car, "seat").unwrap().unwrap();
        let record = MaterialRecord::from_value(&json!({"name": "Steel", "temperature": 400.0, "grade": "S275"})).unwrap();
        bom.node_mut(seat).unwrap().set_material(Some(record));

        let mut selector = MaterialSelector::new();
        selector
            .add_backend(
                BackendDescriptor::from_value(&json!({
                    "class_str": ["table"],
                    "data": {"table": {"Steel": {"density": 7800}, "units": {"density": "kg/m^3"}}}
                }))
                .unwrap(),
            )
            .unwrap();
        bom.assign_all_materials(car, &selector).unwrap();

        let material = bom.node(seat).unwrap().material().unwrap();
        assert_eq!(material.temperature_k(), 400.0);
        assert_eq!(material.extra["grade"], json!("S275"));
        assert_eq!(material.backend.as_ref().unwrap().kind(), "table");

        let bound = bom.bind_material(seat, &selector).unwrap().unwrap();
        assert_eq!(bound.extract("density", &selector).unwrap().value, 7800.0);
        assert!(bom.bind_material(car, &selector).unwrap().is_none());
    }
}
