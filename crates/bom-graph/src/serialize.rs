//! Writing a graph back out as a flat skeleton.

use bom_core::{NodeId, Record, Value};
use bom_skeleton::Skeleton;

use crate::bom::Bom;
use crate::construct::{ASSIGNMENT, CHILDREN, CLASS_STR, COUNT, MATERIAL, PARAMS};
use crate::error::GraphResult;
use crate::node::Node;

impl Bom {
    /// One record per reachable node.
    ///
    /// Children become `{type}` stubs, with `count` when attached more than once.
    pub fn to_skeleton(&self, id: NodeId) -> GraphResult<Skeleton> {
        let mut skeleton = Skeleton::new();
        for (reference, node_id) in self.flatten(id)? {
            skeleton.insert(reference, self.record_of(self.get(node_id)?)?);
        }
        Ok(skeleton)
    }

    fn record_of(&self, node: &Node) -> GraphResult<Record> {
        let mut record = node.fields.clone();
        record.insert(
            CLASS_STR.to_string(),
            Value::Array(node.class_str.iter().cloned().map(Value::String).collect()),
        );
        if !node.assignment.is_empty() {
            record.insert(
                ASSIGNMENT.to_string(),
                Value::Array(node.assignment.iter().cloned().map(Value::String).collect()),
            );
        }
        record.insert(PARAMS.to_string(), node.params.to_value());
        if let Some(material) = &node.material {
            record.insert(MATERIAL.to_string(), material.to_value()?);
        }
        if node.is_assembly() {
            let mut children = Record::new();
            for (reference, &child) in &node.children {
                let child = self.get(child)?;
                let kind = child.type_name().unwrap_or(reference.as_str());
                let mut stub = Record::new();
                stub.insert("type".to_string(), Value::String(kind.to_string()));
                let count = node.count_ref(reference);
                if count > 1 {
                    stub.insert(COUNT.to_string(), Value::from(count));
                }
                children.insert(reference.clone(), Value::Object(stub));
            }
            record.insert(CHILDREN.to_string(), Value::Object(children));
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assemblies_write_child_stubs() {
        let mut bom = Bom::default();
        let wheel = bom.add_assembly("wheel");
        let bolt = bom.add_component("bolt");
        bom.node_mut(bolt).unwrap().insert_field("type", "m8_bolt");
        bom.node_mut(wheel).unwrap().assign("outboard");
        for _ in 0..5 {
            bom.attach(wheel, bolt, None).unwrap();
        }

        let skeleton = bom.to_skeleton(wheel).unwrap();
        let record = skeleton.get("wheel").unwrap();
        assert_eq!(record["children"], json!({"bolt": {"type": "m8_bolt", "count": 5}}));
        assert_eq!(record["class_str"], json!(["Assembly"]));
        assert_eq!(record["assignment"], json!(["outboard"]));
        assert_eq!(
            record["_params"],
            json!({"class_str": ["PintFrame"], "data": {}})
        );
        let bolt = skeleton.get("bolt").unwrap();
        assert!(bolt.get("children").is_none());
        assert!(bolt.get("_material").is_none());
    }
}
