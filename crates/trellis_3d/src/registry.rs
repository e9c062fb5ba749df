//! Node type registry.
//!
//! Maps element names to node descriptors. Names are stored under both the
//! exact and lowercase spellings so markup casing never matters; lookups try
//! the exact name first. Re-registering a name replaces the descriptor
//! without growing the registry.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::mesh::GeometryCache;
use crate::node::{NodeClass, NodeInit};
use crate::nodes::NodeKind;

/// Dense id of a registered node type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeTypeId(pub(crate) u32);

/// Constructs the per-kind state, registering fields and slots on the way.
pub type BuildFn = fn(&mut NodeInit, &mut GeometryCache) -> NodeKind;

/// Everything the runtime knows about one node type.
#[derive(Clone, Copy)]
pub struct NodeDescriptor {
    pub name: &'static str,
    /// Component (feature group) the type belongs to.
    pub component: &'static str,
    /// Capability classes, most general first.
    pub classes: &'static [NodeClass],
    pub build: BuildFn,
}

/// Registry of node types.
pub struct NodeTypeRegistry {
    descriptors: Vec<NodeDescriptor>,
    by_name: FxHashMap<String, NodeTypeId>,
    by_component: FxHashMap<&'static str, Vec<NodeTypeId>>,
}

impl Default for NodeTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            by_name: FxHashMap::default(),
            by_component: FxHashMap::default(),
        }
    }

    /// Create a registry with every standard node type registered.
    pub fn with_standard_nodes() -> Self {
        let mut registry = Self::new();
        crate::nodes::register_standard_nodes(&mut registry);
        registry
    }

    /// Register a node type. Registering an already-known name replaces its
    /// descriptor and returns the existing id.
    pub fn register(&mut self, desc: NodeDescriptor) -> NodeTypeId {
        if let Some(&id) = self.by_name.get(desc.name) {
            debug!(name = desc.name, "node type re-registered");
            self.descriptors[id.0 as usize] = desc;
            return id;
        }
        let id = NodeTypeId(self.descriptors.len() as u32);
        self.by_name.insert(desc.name.to_string(), id);
        let lower = desc.name.to_lowercase();
        if lower != desc.name {
            self.by_name.insert(lower, id);
        }
        self.by_component.entry(desc.component).or_default().push(id);
        self.descriptors.push(desc);
        id
    }

    /// Resolve a name, exact spelling first, then case-insensitively.
    pub fn lookup(&self, name: &str) -> Option<NodeTypeId> {
        if let Some(&id) = self.by_name.get(name) {
            return Some(id);
        }
        self.by_name.get(&name.to_lowercase()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn descriptor(&self, id: NodeTypeId) -> &NodeDescriptor {
        &self.descriptors[id.0 as usize]
    }

    /// All type ids registered under a component.
    pub fn in_component(&self, component: &str) -> &[NodeTypeId] {
        self.by_component
            .get(component)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered type names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.iter().map(|d| d.name)
    }
}
