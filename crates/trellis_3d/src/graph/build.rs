//! Building graph nodes from declarative elements.
//!
//! `build_tree` walks an element tree and materializes nodes: USE references
//! resolve against the name space, ROUTE elements wire routes and produce no
//! node, DEF names (or element ids) register in the space, and children
//! attach under the slot named by their `containerField` attribute when one
//! is given. Unrecognized element names are skipped with their subtrees.

use tracing::{info, warn};
use trellis_core::element::SceneElement;

use super::SceneGraph;
use crate::namespace::SpaceId;
use crate::node::NodeId;
use crate::nodes::NodeKind;

impl SceneGraph {
    /// Build the subtree rooted at `element` into `space`.
    ///
    /// Returns the constructed (or USE-resolved) node. `None` means nothing
    /// to attach: a ROUTE, a dangling USE, or an unrecognized element. An
    /// element already bound to a node returns its existing node; rebinding
    /// is not supported.
    pub fn build_tree(&mut self, space: SpaceId, element: &dyn SceneElement) -> Option<NodeId> {
        let key = element.key();
        if let Some(&existing) = self.element_bindings.get(&key) {
            warn!(tag = element.tag(), "element is already bound to a node");
            return Some(existing);
        }

        if let Some(use_name) = element.attribute("USE") {
            let found = self.spaces.get(space).and_then(|ns| ns.def(use_name));
            if found.is_none() {
                warn!(name = use_name, "USE reference not found");
            }
            return found;
        }

        if element.tag().eq_ignore_ascii_case("route") {
            self.build_route(space, element);
            return None;
        }

        if self.registry.lookup(element.tag()).is_none() {
            info!(tag = element.tag(), "unrecognized element, skipping subtree");
            return None;
        }
        let id = self.create_node(element.tag(), space, Some(element))?;

        let def = element
            .attribute("DEF")
            .or_else(|| element.attribute("id"))
            .map(str::to_string);
        if let Some(def) = def {
            if let Some(ns) = self.spaces.get_mut(space) {
                ns.define(def.clone(), id);
            }
            if let Some(node) = self.nodes.get_mut(id) {
                node.def_name = Some(def);
            }
        }
        self.element_bindings.insert(key, id);

        if self.scene_root.is_none()
            && matches!(self.nodes.get(id).map(|n| &n.kind), Some(NodeKind::SceneRoot))
        {
            self.scene_root = Some(id);
        }

        element.for_each_child(&mut |child_el| {
            if let Some(child) = self.build_tree(space, child_el) {
                self.add_child(id, child, child_el.attribute("containerField"));
            }
        });

        self.node_changed(id);
        Some(id)
    }

    /// The node an element was built into, if any.
    pub fn node_for_element(&self, key: trellis_core::element::ElementKey) -> Option<NodeId> {
        self.element_bindings.get(&key).copied()
    }

    fn build_route(&mut self, space: SpaceId, element: &dyn SceneElement) {
        let (Some(from_def), Some(from_field), Some(to_def), Some(to_field)) = (
            element.attribute("fromNode"),
            element.attribute("fromField"),
            element.attribute("toNode"),
            element.attribute("toField"),
        ) else {
            warn!("route is missing one of fromNode/fromField/toNode/toField");
            return;
        };
        let Some(ns) = self.spaces.get(space) else {
            return;
        };
        let (Some(from), Some(to)) = (ns.def(from_def), ns.def(to_def)) else {
            warn!(
                from = from_def,
                to = to_def,
                "route endpoint not found, discarding route"
            );
            return;
        };
        self.setup_route(from, from_field, to, to_field);
    }
}
