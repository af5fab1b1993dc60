//! Engineering objects: the nodes of a bill of materials.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use bom_core::{NodeId, Record, RegistryId, Value};
use bom_materials::MaterialRecord;
use bom_params::{FrameOptions, ParameterFrame};

use crate::error::{GraphError, GraphResult};

/// What a node can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Leaf part made of one material.
    Component,
    /// Composite of other nodes, no material of its own.
    Assembly,
    /// Composite treated as one body with an aggregate material.
    HomogenisedAssembly,
}

impl NodeKind {
    pub fn class_str(self) -> &'static str {
        match self {
            NodeKind::Component => "Component",
            NodeKind::Assembly => "Assembly",
            NodeKind::HomogenisedAssembly => "HomogenisedAssembly",
        }
    }

    pub fn is_assembly(self) -> bool {
        matches!(self, NodeKind::Assembly | NodeKind::HomogenisedAssembly)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_str())
    }
}

/// One engineering object.
///
/// Structural links (`children`, `counts`, `registry`) are owned by the [`crate::Bom`]
/// and change only through `attach`/`detach`.
#[derive(Clone, Debug)]
pub struct Node {
    pub(crate) reference: String,
    pub(crate) kind: NodeKind,
    pub(crate) class_str: Vec<String>,
    pub(crate) assignment: BTreeSet<String>,
    pub(crate) params: ParameterFrame,
    pub(crate) material: Option<MaterialRecord>,
    pub(crate) fields: Record,
    pub(crate) children: BTreeMap<String, NodeId>,
    pub(crate) counts: BTreeMap<String, usize>,
    pub(crate) registry: Option<RegistryId>,
}

impl Node {
    pub fn new(reference: impl Into<String>, kind: NodeKind, frame: FrameOptions) -> Self {
        Self {
            reference: reference.into(),
            kind,
            class_str: vec![kind.class_str().to_string()],
            assignment: BTreeSet::new(),
            params: ParameterFrame::new(frame),
            material: None,
            fields: Record::new(),
            children: BTreeMap::new(),
            counts: BTreeMap::new(),
            registry: None,
        }
    }

    pub fn component(reference: impl Into<String>, frame: FrameOptions) -> Self {
        Self::new(reference, NodeKind::Component, frame)
    }

    pub fn assembly(reference: impl Into<String>, frame: FrameOptions) -> Self {
        Self::new(reference, NodeKind::Assembly, frame)
    }

    pub fn homogenised(reference: impl Into<String>, frame: FrameOptions) -> Self {
        Self::new(reference, NodeKind::HomogenisedAssembly, frame)
    }

    pub fn with_material(mut self, material: MaterialRecord) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_assembly(&self) -> bool {
        self.kind.is_assembly()
    }

    pub fn class_str(&self) -> &[String] {
        &self.class_str
    }

    /// The catalog type this node was built from, if recorded.
    pub fn type_name(&self) -> Option<&str> {
        self.fields.get("type").and_then(Value::as_str)
    }

    pub fn assignment(&self) -> &BTreeSet<String> {
        &self.assignment
    }

    pub fn assign(&mut self, tag: impl Into<String>) {
        self.assignment.insert(tag.into());
    }

    pub fn params(&self) -> &ParameterFrame {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ParameterFrame {
        &mut self.params
    }

    pub fn material(&self) -> Option<&MaterialRecord> {
        self.material.as_ref()
    }

    pub fn material_mut(&mut self) -> Option<&mut MaterialRecord> {
        self.material.as_mut()
    }

    pub fn set_material(&mut self, material: Option<MaterialRecord>) {
        self.material = material;
    }

    pub fn fields(&self) -> &Record {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn insert_field(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Children by reference. Empty for components.
    pub fn children(&self) -> &BTreeMap<String, NodeId> {
        &self.children
    }

    /// How many times `reference` was attached under this node.
    pub fn count_ref(&self, reference: &str) -> usize {
        self.counts.get(reference).copied().unwrap_or(0)
    }

    pub(crate) fn parse_assignment(reference: &str, value: &Value) -> GraphResult<BTreeSet<String>> {
        let invalid = || GraphError::InvalidRecord {
            reference: reference.to_string(),
            what: "'assignment' must be a string or a list of strings".to_string(),
        };
        match value {
            Value::Null => Ok(BTreeSet::new()),
            Value::String(tag) => Ok(BTreeSet::from([tag.clone()])),
            Value::Array(tags) => tags
                .iter()
                .map(|tag| tag.as_str().map(str::to_string).ok_or_else(invalid))
                .collect(),
            _ => Err(invalid()),
        }
    }
}

/// Builds a blank node of a registered class.
pub type NodeFactory = fn(&str, FrameOptions) -> Node;

/// Named node classes, looked up from a record's `class_str`.
#[derive(Clone)]
pub struct NodeClasses {
    factories: BTreeMap<String, NodeFactory>,
}

impl fmt::Debug for NodeClasses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

impl Default for NodeClasses {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn component_factory(reference: &str, frame: FrameOptions) -> Node {
    Node::component(reference, frame)
}

fn assembly_factory(reference: &str, frame: FrameOptions) -> Node {
    Node::assembly(reference, frame)
}

fn homogenised_factory(reference: &str, frame: FrameOptions) -> Node {
    Node::homogenised(reference, frame)
}

impl NodeClasses {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// `Component`, `Assembly` and `HomogenisedAssembly`.
    pub fn with_builtins() -> Self {
        let mut classes = Self::empty();
        classes.register(NodeKind::Component.class_str(), component_factory);
        classes.register(NodeKind::Assembly.class_str(), assembly_factory);
        classes.register(NodeKind::HomogenisedAssembly.class_str(), homogenised_factory);
        classes
    }

    pub fn register(&mut self, name: impl Into<String>, factory: NodeFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(short_name(name))
    }

    /// The first class in `class_str` that is registered. Dotted names match on
    /// their last segment.
    pub fn create(
        &self,
        class_str: &[String],
        reference: &str,
        frame: FrameOptions,
    ) -> GraphResult<Node> {
        let factory = class_str
            .iter()
            .find_map(|name| self.factories.get(short_name(name)))
            .ok_or_else(|| GraphError::UnknownNodeClass {
                class_str: class_str.join(", "),
            })?;
        let mut node = factory(reference, frame);
        node.class_str = class_str.to_vec();
        Ok(node)
    }
}

fn short_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
