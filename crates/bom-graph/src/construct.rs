//! Building nodes from skeleton records.

use bom_core::{NodeId, Record, RegistryId, Value};
use bom_materials::MaterialRecord;
use bom_params::ParameterFrame;
use bom_skeleton::Skeleton;
use tracing::debug;

use crate::bom::Bom;
use crate::error::{GraphError, GraphResult};
use crate::node::{Node, NodeKind};

pub(crate) const CHILDREN: &str = "children";
pub(crate) const COUNT: &str = "count";
pub(crate) const CLASS_STR: &str = "class_str";
pub(crate) const ASSIGNMENT: &str = "assignment";
pub(crate) const PARAMS: &str = "_params";
pub(crate) const MATERIAL: &str = "_material";

impl Bom {
    /// Build `reference` and everything below it as a new, unconnected graph.
    ///
    /// A reference met twice is built once and shared. On failure the arena is
    /// left as it was before the call.
    pub fn from_skeleton(&mut self, skeleton: &Skeleton, reference: &str) -> GraphResult<NodeId> {
        let (nodes, registries) = (self.nodes.len(), self.registries.len());
        let mut path = Vec::new();
        let built = self.instantiate(skeleton, reference, None, &mut path);
        if built.is_err() {
            self.nodes.truncate(nodes);
            self.registries.truncate(registries);
            // the top may have landed in a reused registry slot
            for table in &mut self.registries {
                table.retain(|_, id| id.index() < nodes);
            }
        }
        built
    }

    /// Deep copy of `id` and its descendants into a fresh, unconnected graph.
    pub fn copy_part(&mut self, id: NodeId) -> GraphResult<NodeId> {
        let skeleton = self.to_skeleton(id)?;
        let reference = self.get(id)?.reference.clone();
        self.from_skeleton(&skeleton, &reference)
    }

    fn instantiate(
        &mut self,
        skeleton: &Skeleton,
        reference: &str,
        registry: Option<RegistryId>,
        path: &mut Vec<NodeId>,
    ) -> GraphResult<NodeId> {
        let record = skeleton
            .get(reference)
            .ok_or_else(|| GraphError::MissingRecord {
                reference: reference.to_string(),
            })?;
        let node = self.node_from_record(reference, record)?;
        let children = child_stubs(reference, record)?;
        if !children.is_empty() && !node.is_assembly() {
            return Err(GraphError::NotAnAssembly {
                reference: reference.to_string(),
            });
        }

        let id = match registry {
            Some(registry) => self.insert_into(node, registry),
            None => self.add_node(node),
        };
        let registry = self.get(id)?.registry;

        path.push(id);
        for (child_ref, count) in children {
            let existing = match registry {
                Some(group) => self
                    .registries
                    .get(group.index())
                    .and_then(|table| table.get(&child_ref))
                    .copied(),
                None => None,
            };
            let child = match existing {
                Some(child) if path.contains(&child) => {
                    return Err(GraphError::HierarchyCycle { reference: child_ref });
                }
                Some(child) => child,
                None => self.instantiate(skeleton, &child_ref, registry, path)?,
            };
            let node = self.get_mut(id)?;
            node.children.insert(child_ref.clone(), child);
            *node.counts.entry(child_ref).or_insert(0) += count;
        }
        path.pop();
        Ok(id)
    }

    /// A detached node from one skeleton record; children are not linked.
    pub fn node_from_record(&self, reference: &str, record: &Record) -> GraphResult<Node> {
        let class_str = match record.get(CLASS_STR) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::String(name)) => vec![name.clone()],
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(_) => {
                return Err(GraphError::InvalidRecord {
                    reference: reference.to_string(),
                    what: "'class_str' must be a string or list".to_string(),
                });
            }
        };
        let frame = self.options.frame;
        let mut node = if class_str.is_empty() {
            match record.get(CHILDREN) {
                Some(Value::Object(_)) => Node::assembly(reference, frame),
                _ => Node::component(reference, frame),
            }
        } else {
            self.options.classes.create(&class_str, reference, frame)?
        };

        for (key, value) in record {
            match key.as_str() {
                CHILDREN | CLASS_STR => {}
                ASSIGNMENT => node.assignment = Node::parse_assignment(reference, value)?,
                PARAMS => node.params = ParameterFrame::from_value(value, frame)?,
                MATERIAL => {
                    if !value.is_null() {
                        node.material = Some(MaterialRecord::from_value(value)?);
                    }
                }
                _ => {
                    node.fields.insert(key.clone(), value.clone());
                }
            }
        }
        if node.kind == NodeKind::Component && node.material.is_none() {
            debug!(reference, "component has no material");
        }
        Ok(node)
    }
}

/// `(reference, count)` for each declared child.
fn child_stubs(reference: &str, record: &Record) -> GraphResult<Vec<(String, usize)>> {
    let invalid = |what: String| GraphError::InvalidRecord {
        reference: reference.to_string(),
        what,
    };
    match record.get(CHILDREN) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(children)) => children
            .iter()
            .map(|(child, stub)| {
                let count = match stub.get(COUNT) {
                    None | Some(Value::Null) => 1,
                    Some(count) => count
                        .as_u64()
                        .filter(|&count| count > 0)
                        .and_then(|count| usize::try_from(count).ok())
                        .ok_or_else(|| invalid(format!("count of '{child}' must be a positive integer")))?,
                };
                Ok((child.clone(), count))
            })
            .collect(),
        Some(_) => Err(invalid("'children' must be a mapping".to_string())),
    }
}
