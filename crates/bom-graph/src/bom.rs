//! The node arena and its master registries.

use std::collections::{BTreeMap, BTreeSet};

use bom_core::{NodeId, RegistryId};
use bom_params::FrameOptions;
use tracing::{debug, error, warn};

use crate::error::{GraphError, GraphResult};
use crate::node::{Node, NodeClasses};

/// Reference -> node for one connected graph.
pub type Registry = BTreeMap<String, NodeId>;

/// Options injected into graph construction.
#[derive(Clone, Debug, Default)]
pub struct GraphOptions {
    pub frame: FrameOptions,
    pub classes: NodeClasses,
}

/// A bill of materials: every node lives here and is addressed by [`NodeId`].
///
/// Nodes that are connected (through any chain of parent/child links) share one
/// registry table. A reference names exactly one node within a registry.
#[derive(Clone, Debug, Default)]
pub struct Bom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) registries: Vec<Registry>,
    pub(crate) options: GraphOptions,
}

impl Bom {
    pub fn new(options: GraphOptions) -> Self {
        Self {
            nodes: Vec::new(),
            registries: Vec::new(),
            options,
        }
    }

    pub fn options(&self) -> &GraphOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    pub(crate) fn get(&self, id: NodeId) -> GraphResult<&Node> {
        self.nodes.get(id.index()).ok_or(GraphError::UnknownNode { id })
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> GraphResult<&mut Node> {
        self.nodes
            .get_mut(id.index())
            .ok_or(GraphError::UnknownNode { id })
    }

    fn group(&self, id: NodeId) -> GraphResult<RegistryId> {
        self.get(id)?.registry.ok_or(GraphError::UnknownNode { id })
    }

    /// A fresh registry, reusing a slot emptied by a merge or a detach.
    fn new_registry(&mut self) -> RegistryId {
        if let Some(index) = self.registries.iter().position(Registry::is_empty) {
            return RegistryId::from_index(index);
        }
        self.registries.push(Registry::new());
        RegistryId::from_index(self.registries.len() - 1)
    }

    /// Add a node as its own unconnected graph.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let registry = self.new_registry();
        self.insert_into(node, registry)
    }

    pub(crate) fn insert_into(&mut self, mut node: Node, registry: RegistryId) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        node.registry = Some(registry);
        if let Some(table) = self.registries.get_mut(registry.index()) {
            table.insert(node.reference.clone(), id);
        }
        self.nodes.push(node);
        id
    }

    /// Shorthand for a leaf node with the configured frame options.
    pub fn add_component(&mut self, reference: impl Into<String>) -> NodeId {
        let node = Node::component(reference, self.options.frame);
        self.add_node(node)
    }

    /// Shorthand for an empty assembly with the configured frame options.
    pub fn add_assembly(&mut self, reference: impl Into<String>) -> NodeId {
        let node = Node::assembly(reference, self.options.frame);
        self.add_node(node)
    }

    /// The master registry of the graph `id` belongs to.
    pub fn registry(&self, id: NodeId) -> GraphResult<&Registry> {
        let group = self.group(id)?;
        self.registries
            .get(group.index())
            .ok_or(GraphError::UnknownNode { id })
    }

    /// Resolve a reference anywhere in the graph `id` belongs to.
    pub fn resolve(&self, id: NodeId, reference: &str) -> GraphResult<Option<NodeId>> {
        Ok(self.registry(id)?.get(reference).copied())
    }

    pub fn children(&self, id: NodeId) -> GraphResult<&BTreeMap<String, NodeId>> {
        Ok(&self.get(id)?.children)
    }

    pub fn count_ref(&self, parent: NodeId, reference: &str) -> GraphResult<usize> {
        Ok(self.get(parent)?.count_ref(reference))
    }

    fn has_parent(&self, id: NodeId) -> bool {
        self.nodes
            .iter()
            .any(|node| node.children.values().any(|&child| child == id))
    }

    /// Whether `target` is `from` or one of its descendants.
    pub(crate) fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = BTreeSet::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.node(id) {
                stack.extend(node.children.values().copied());
            }
        }
        false
    }

    fn duplicate(reference: &str) -> GraphError {
        let err = GraphError::DuplicateReference {
            reference: reference.to_string(),
        };
        error!("{err}");
        err
    }

    /// Attach `child` beneath `parent`.
    ///
    /// `reference` renames an unattached child first. Attaching the same node under
    /// the same reference again only increments its count. Fails when any
    /// reference of the child's graph names a different node in the parent's.
    pub fn attach(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<&str>,
    ) -> GraphResult<()> {
        let parent_node = self.get(parent)?;
        if !parent_node.is_assembly() {
            return Err(GraphError::NotAnAssembly {
                reference: parent_node.reference.clone(),
            });
        }
        if let Some(requested) = reference {
            self.rename_unattached(child, requested)?;
        }
        let child_ref = self.get(child)?.reference.clone();
        if self.reaches(child, parent) {
            return Err(GraphError::HierarchyCycle {
                reference: child_ref,
            });
        }
        if let Some(&existing) = self.get(parent)?.children.get(&child_ref)
            && existing != child
        {
            return Err(Self::duplicate(&child_ref));
        }

        let parent_group = self.group(parent)?;
        let child_group = self.group(child)?;
        if parent_group != child_group {
            self.merge_registries(parent_group, child_group)?;
        }

        let node = self.get_mut(parent)?;
        node.children.insert(child_ref.clone(), child);
        *node.counts.entry(child_ref.clone()).or_insert(0) += 1;
        debug!(parent = %node.reference, child = %child_ref, "attached");
        Ok(())
    }

    fn rename_unattached(&mut self, child: NodeId, requested: &str) -> GraphResult<()> {
        let current = self.get(child)?.reference.clone();
        if current == requested {
            return Ok(());
        }
        if self.has_parent(child) {
            return Err(GraphError::ReferenceMismatch {
                requested: requested.to_string(),
                current,
            });
        }
        let group = self.group(child)?;
        if let Some(table) = self.registries.get_mut(group.index()) {
            if table.get(requested).is_some_and(|&id| id != child) {
                return Err(Self::duplicate(requested));
            }
            table.remove(&current);
            table.insert(requested.to_string(), child);
        }
        self.get_mut(child)?.reference = requested.to_string();
        Ok(())
    }

    /// Fold registry `from` into `into`, re-pointing every node of `from`.
    fn merge_registries(&mut self, into: RegistryId, from: RegistryId) -> GraphResult<()> {
        let incoming = self
            .registries
            .get(from.index())
            .cloned()
            .unwrap_or_default();
        let target = self
            .registries
            .get(into.index())
            .cloned()
            .unwrap_or_default();
        for (reference, id) in &incoming {
            if target.get(reference).is_some_and(|existing| existing != id) {
                return Err(Self::duplicate(reference));
            }
        }
        if let Some(table) = self.registries.get_mut(into.index()) {
            table.extend(incoming);
        }
        if let Some(table) = self.registries.get_mut(from.index()) {
            table.clear();
        }
        for node in &mut self.nodes {
            if node.registry == Some(from) {
                node.registry = Some(into);
            }
        }
        Ok(())
    }

    /// Remove one attachment of `reference` from `parent`.
    ///
    /// When the count reaches zero the child is unlinked and the registries of
    /// everything that was connected are rebuilt from scratch. Unknown references
    /// are ignored with a warning.
    pub fn detach(&mut self, parent: NodeId, reference: &str) -> GraphResult<()> {
        let node = self.get_mut(parent)?;
        if !node.kind.is_assembly() {
            return Err(GraphError::NotAnAssembly {
                reference: node.reference.clone(),
            });
        }
        match node.counts.get(reference).copied().unwrap_or(0) {
            0 => {
                warn!(
                    "trying to remove a component <{reference}> that does not exist in the assembly <{}>",
                    node.reference
                );
                Ok(())
            }
            1 => {
                node.counts.remove(reference);
                node.children.remove(reference);
                let group = self.group(parent)?;
                self.recompute(group);
                Ok(())
            }
            count => {
                node.counts.insert(reference.to_string(), count - 1);
                Ok(())
            }
        }
    }

    /// Split a registry group into its connected parts, one registry each.
    fn recompute(&mut self, group: RegistryId) {
        let members: Vec<NodeId> = (0..self.nodes.len())
            .map(NodeId::from_index)
            .filter(|&id| self.nodes[id.index()].registry == Some(group))
            .collect();

        let mut neighbours: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
        for &id in &members {
            for &child in self.nodes[id.index()].children.values() {
                neighbours.entry(id).or_default().push(child);
                neighbours.entry(child).or_default().push(id);
            }
        }

        let mut assigned: BTreeSet<NodeId> = BTreeSet::new();
        let mut first = true;
        for &start in &members {
            if assigned.contains(&start) {
                continue;
            }
            let registry = if first {
                first = false;
                if let Some(table) = self.registries.get_mut(group.index()) {
                    table.clear();
                }
                group
            } else {
                self.new_registry()
            };

            let mut stack = vec![start];
            while let Some(id) = stack.pop() {
                if !assigned.insert(id) {
                    continue;
                }
                let node = &mut self.nodes[id.index()];
                node.registry = Some(registry);
                let reference = node.reference.clone();
                if let Some(table) = self.registries.get_mut(registry.index()) {
                    table.insert(reference, id);
                }
                if let Some(next) = neighbours.get(&id) {
                    stack.extend(next.iter().copied());
                }
            }
        }
    }

    /// Reference -> node for everything reachable from `id`, including itself.
    pub fn flatten(&self, id: NodeId) -> GraphResult<Registry> {
        let mut flat = Registry::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.get(current)?;
            match flat.get(&node.reference) {
                Some(&seen) if seen == current => continue,
                Some(_) => return Err(Self::duplicate(&node.reference)),
                None => {
                    flat.insert(node.reference.clone(), current);
                }
            }
            stack.extend(node.children.values().rev().copied());
        }
        Ok(flat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(registry: &Registry) -> Vec<&str> {
        registry.keys().map(String::as_str).collect()
    }

    #[test]
    fn attach_merges_registries() {
        let mut bom = Bom::default();
        let car = bom.add_assembly("car");
        let engine = bom.add_assembly("engine");
        let piston = bom.add_component("piston");
        bom.attach(engine, piston, None).unwrap();
        bom.attach(car, engine, None).unwrap();

        assert_eq!(keys(bom.registry(car).unwrap()), vec!["car", "engine", "piston"]);
        assert_eq!(bom.registry(piston).unwrap(), bom.registry(car).unwrap());
        assert_eq!(bom.resolve(piston, "car").unwrap(), Some(car));
    }

    #[test]
    fn same_instance_counts_up() {
        let mut bom = Bom::default();
        let wheel = bom.add_assembly("wheel");
        let bolt = bom.add_component("bolt");
        for _ in 0..5 {
            bom.attach(wheel, bolt, None).unwrap();
        }
        assert_eq!(bom.count_ref(wheel, "bolt").unwrap(), 5);
        assert_eq!(bom.children(wheel).unwrap().len(), 1);
    }

    #[test]
    fn distinct_instances_collide() {
        let mut bom = Bom::default();
        let car = bom.add_assembly("car");
        let first = bom.add_component("bolt");
        let second = bom.add_component("bolt");
        bom.attach(car, first, None).unwrap();
        let err = bom.attach(car, second, None).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateReference { reference } if reference == "bolt"));
    }

    #[test]
    fn collisions_deep_in_the_subgraph() {
        let mut bom = Bom::default();
        let car = bom.add_assembly("car");
        let engine = bom.add_assembly("engine");
        let bolt_a = bom.add_component("bolt");
        let bolt_b = bom.add_component("bolt");
        bom.attach(car, bolt_a, None).unwrap();
        bom.attach(engine, bolt_b, None).unwrap();
        assert!(matches!(
            bom.attach(car, engine, None),
            Err(GraphError::DuplicateReference { .. })
        ));
    }

    #[test]
    fn leaves_and_cycles_are_rejected() {
        let mut bom = Bom::default();
        let car = bom.add_assembly("car");
        let engine = bom.add_assembly("engine");
        let piston = bom.add_component("piston");
        assert!(matches!(
            bom.attach(piston, engine, None),
            Err(GraphError::NotAnAssembly { .. })
        ));
        bom.attach(car, engine, None).unwrap();
        assert!(matches!(
            bom.attach(engine, car, None),
            Err(GraphError::HierarchyCycle { .. })
        ));
        assert!(matches!(
            bom.attach(car, car, None),
            Err(GraphError::HierarchyCycle { .. })
        ));
    }

    #[test]
    fn attach_with_new_reference() {
        let mut bom = Bom::default();
        let car = bom.add_assembly("car");
        let wheel = bom.add_component("wheel");
        bom.attach(car, wheel, Some("front_wheel")).unwrap();
        assert_eq!(bom.node(wheel).unwrap().reference(), "front_wheel");
        assert_eq!(bom.resolve(car, "front_wheel").unwrap(), Some(wheel));
        assert!(matches!(
            bom.attach(car, wheel, Some("rear_wheel")),
            Err(GraphError::ReferenceMismatch { .. })
        ));
    }

    #[test]
    fn detach_recomputes_registries() {
        let mut bom = Bom::default();
        let car = bom.add_assembly("car");
        let engine = bom.add_assembly("engine");
        let piston = bom.add_component("piston");
        let seat = bom.add_component("seat");
        bom.attach(engine, piston, None).unwrap();
        bom.attach(car, engine, None).unwrap();
        bom.attach(car, seat, None).unwrap();
        bom.attach(car, seat, None).unwrap();

        bom.detach(car, "seat").unwrap();
        assert_eq!(bom.count_ref(car, "seat").unwrap(), 1);
        assert!(bom.resolve(car, "seat").unwrap().is_some());

        bom.detach(car, "engine").unwrap();
        assert_eq!(keys(bom.registry(car).unwrap()), vec!["car", "seat"]);
        assert_eq!(keys(bom.registry(engine).unwrap()), vec!["engine", "piston"]);

        // unknown references are only warned about
        bom.detach(car, "radio").unwrap();
    }

    #[test]
    fn attach_detach_cycles_reuse_registry_slots() {
        let mut bom = Bom::default();
        let car = bom.add_assembly("car");
        let seat = bom.add_component("seat");
        for _ in 0..10 {
            bom.attach(car, seat, None).unwrap();
            bom.detach(car, "seat").unwrap();
        }
        assert_eq!(bom.registries.len(), 2);
        assert_eq!(keys(bom.registry(car).unwrap()), vec!["car"]);
        assert_eq!(keys(bom.registry(seat).unwrap()), vec!["seat"]);

        let spare = bom.add_component("spare");
        bom.attach(car, spare, None).unwrap();
        let wheel = bom.add_component("wheel");
        assert_eq!(bom.registries.len(), 3);
        assert_eq!(keys(bom.registry(wheel).unwrap()), vec!["wheel"]);
    }

    #[test]
    fn shared_child_stays_registered_until_last_parent_lets_go() {
        let mut bom = Bom::default();
        let car = bom.add_assembly("car");
        let front = bom.add_assembly("front");
        let rear = bom.add_assembly("rear");
        let bolt = bom.add_component("bolt");
        bom.attach(car, front, None).unwrap();
        bom.attach(car, rear, None).unwrap();
        bom.attach(front, bolt, None).unwrap();
        bom.attach(rear, bolt, None).unwrap();

        bom.detach(front, "bolt").unwrap();
        assert_eq!(bom.resolve(car, "bolt").unwrap(), Some(bolt));
        bom.detach(rear, "bolt").unwrap();
        assert_eq!(bom.resolve(car, "bolt").unwrap(), None);
        assert_eq!(keys(bom.registry(bolt).unwrap()), vec!["bolt"]);
    }

    #[test]
    fn flatten_visits_shared_nodes_once() {
        let mut bom = Bom::default();
        let car = bom.add_assembly("car");
        let front = bom.add_assembly("front");
        let rear = bom.add_assembly("rear");
        let bolt = bom.add_component("bolt");
        bom.attach(car, front, None).unwrap();
        bom.attach(car, rear, None).unwrap();
        bom.attach(front, bolt, None).unwrap();
        bom.attach(rear, bolt, None).unwrap();

        let flat = bom.flatten(car).unwrap();
        assert_eq!(keys(&flat), vec!["bolt", "car", "front", "rear"]);
        assert_eq!(keys(&bom.flatten(front).unwrap()), vec!["bolt", "front"]);
    }
}
