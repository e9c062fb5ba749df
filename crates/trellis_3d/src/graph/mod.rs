//! The scene graph context.
//!
//! One [`SceneGraph`] owns everything a loaded scene needs: the node arena,
//! the name spaces, the type registry, the geometry cache, bindable stacks,
//! route wiring, and the pick map. There is no global state; independent
//! graphs never observe each other.

mod build;
mod routes;
#[cfg(test)]
mod tests;

pub use routes::Route;
pub(crate) use routes::{QueuedMessage, Watcher};

use std::collections::VecDeque;

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{trace, warn};
use trellis_core::element::ElementKey;
use trellis_core::field::{FieldKind, FieldValue};

use crate::bindable::{BindableBag, BindableKind};
use crate::math::{intersect_aabb, intersect_triangle, BoundingBox, Ray};
use crate::mesh::{GeometryCache, Mesh, Primitive};
use crate::namespace::{Namespace, SpaceId};
use crate::node::{ChildLink, NodeId, NodeInit, SceneNode, SlotArity};
use crate::nodes::{composed, geometry, grouping, shape, NodeKind, RenderHandle};
use crate::registry::NodeTypeRegistry;

/// A shape scheduled for rendering, with its accumulated world transform.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Drawable {
    pub transform: Mat4,
    pub shape: NodeId,
}

/// Nearest intersection found by [`SceneGraph::intersect`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PickResult {
    /// The shape that was hit.
    pub node: NodeId,
    /// Hit point in the coordinate space the ray was given in.
    pub point: Vec3,
    /// Ray parameter of the hit (`point = origin + distance * dir`).
    pub distance: f32,
}

pub struct SceneGraph {
    nodes: SlotMap<NodeId, SceneNode>,
    spaces: SlotMap<SpaceId, Namespace>,
    root_space: SpaceId,
    registry: NodeTypeRegistry,
    geometry_cache: GeometryCache,
    pub(crate) bindable_bag: BindableBag,
    pub(crate) watchers: FxHashMap<NodeId, Vec<(String, Watcher)>>,
    routes: Vec<Route>,
    element_bindings: FxHashMap<ElementKey, NodeId>,
    pick_map: FxHashMap<u32, NodeId>,
    next_pick_id: u32,
    retired: Vec<RenderHandle>,
    scene_root: Option<NodeId>,
    msg_queue: VecDeque<QueuedMessage>,
    draining: bool,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// A graph with every standard node type registered.
    pub fn new() -> Self {
        Self::with_registry(NodeTypeRegistry::with_standard_nodes())
    }

    /// A graph with a caller-provided registry, for hosts that register
    /// extension node types.
    pub fn with_registry(registry: NodeTypeRegistry) -> Self {
        let mut spaces = SlotMap::with_key();
        let root_space = spaces.insert(Namespace::new("scene"));
        Self {
            nodes: SlotMap::with_key(),
            spaces,
            root_space,
            registry,
            geometry_cache: GeometryCache::new(),
            bindable_bag: BindableBag::default(),
            watchers: FxHashMap::default(),
            routes: Vec::new(),
            element_bindings: FxHashMap::default(),
            pick_map: FxHashMap::default(),
            next_pick_id: 0,
            retired: Vec::new(),
            scene_root: None,
            msg_queue: VecDeque::new(),
            draining: false,
        }
    }

    // Accessors

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn registry(&self) -> &NodeTypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodeTypeRegistry {
        &mut self.registry
    }

    pub fn geometry_cache(&self) -> &GeometryCache {
        &self.geometry_cache
    }

    /// The first `Scene` node built into this graph, if any.
    pub fn scene_root(&self) -> Option<NodeId> {
        self.scene_root
    }

    pub fn set_scene_root(&mut self, id: NodeId) {
        self.scene_root = Some(id);
    }

    // Name spaces

    /// The document-level name space every graph starts with.
    pub fn root_space(&self) -> SpaceId {
        self.root_space
    }

    /// Create a child name space, as used for inlined documents.
    pub fn create_space(&mut self, name: impl Into<String>, parent: Option<SpaceId>) -> SpaceId {
        let mut ns = Namespace::new(name);
        ns.parent = parent;
        let id = self.spaces.insert(ns);
        if let Some(parent) = parent {
            if let Some(pns) = self.spaces.get_mut(parent) {
                pns.children.push(id);
            }
        }
        id
    }

    pub fn space(&self, id: SpaceId) -> Option<&Namespace> {
        self.spaces.get(id)
    }

    pub fn space_mut(&mut self, id: SpaceId) -> Option<&mut Namespace> {
        self.spaces.get_mut(id)
    }

    // Node construction

    /// Create a node of a registered type, reading initial field values from
    /// `element` when given. The node starts parentless.
    pub fn create_node(
        &mut self,
        type_name: &str,
        space: SpaceId,
        element: Option<&dyn trellis_core::element::SceneElement>,
    ) -> Option<NodeId> {
        self.create_node_impl(type_name, Some(space), element, false)
    }

    /// Create a runtime-synthesized node (default appearance, default
    /// bindables). Marked `auto_gen` so hosts can tell it from authored
    /// content.
    pub(crate) fn create_default_node(&mut self, type_name: &str) -> Option<NodeId> {
        self.create_node_impl(type_name, None, None, true)
    }

    fn create_node_impl(
        &mut self,
        type_name: &str,
        space: Option<SpaceId>,
        element: Option<&dyn trellis_core::element::SceneElement>,
        auto_gen: bool,
    ) -> Option<NodeId> {
        let Some(type_id) = self.registry.lookup(type_name) else {
            warn!(name = type_name, "unknown node type");
            return None;
        };
        let desc = *self.registry.descriptor(type_id);

        let mut init = NodeInit::new(desc.name, element);
        // Every node carries a metadata slot ahead of its own declarations.
        init.single("metadata", crate::node::NodeClass::Metadata);
        let kind = (desc.build)(&mut init, &mut self.geometry_cache);
        let (fields, slots) = init.finish();

        let bindable = BindableKind::of(&kind);
        let id = self.nodes.insert(SceneNode {
            type_id,
            type_name: desc.name,
            classes: desc.classes,
            def_name: None,
            space,
            element: element.map(|e| e.key()),
            auto_gen,
            fields,
            slots,
            links: Vec::new(),
            parents: Default::default(),
            kind,
        });
        if let Some(kind) = bindable {
            self.bindable_bag.register(kind, id);
        }
        Some(id)
    }

    /// Remove a node: detach it from parents and children, drop its routes
    /// and bindable registration, and free the arena slot.
    pub fn remove_node(&mut self, id: NodeId) {
        let (parents, children, bindable, element) = match self.nodes.get(id) {
            Some(node) => (
                node.parents().to_vec(),
                node.children().collect::<Vec<_>>(),
                BindableKind::of(&node.kind),
                node.element,
            ),
            None => return,
        };
        if let Some(kind) = bindable {
            self.bindable_bag.unregister(kind, id);
        }
        for parent in parents {
            self.remove_child(parent, id);
        }
        for child in children {
            self.remove_child(id, child);
        }
        if let Some(key) = element {
            self.element_bindings.remove(&key);
        }
        self.watchers.remove(&id);
        self.routes.retain(|r| r.from != id && r.to != id);
        if self.scene_root == Some(id) {
            self.scene_root = None;
        }
        self.nodes.remove(id);
    }

    // Parent/child wiring

    /// Attach `child` under `parent`.
    ///
    /// With a container field name the named slot must exist and accept the
    /// child's class; without one the first declared slot accepting the class
    /// is used. Attaching to an occupied single slot displaces the previous
    /// occupant. Returns false when no slot matches.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId, container_field: Option<&str>) -> bool {
        let Some(child_node) = self.nodes.get(child) else {
            return false;
        };
        let child_classes = child_node.classes;
        let Some(parent_node) = self.nodes.get(parent) else {
            return false;
        };

        let slot = match container_field {
            Some(name) => parent_node
                .slot_index(name)
                .filter(|&i| child_classes.contains(&parent_node.slots[i].accepts)),
            None => parent_node
                .slots
                .iter()
                .position(|s| child_classes.contains(&s.accepts)),
        };
        let Some(slot) = slot else {
            warn!(
                parent = parent_node.type_name,
                child = self.nodes.get(child).map(|n| n.type_name).unwrap_or("?"),
                field = container_field.unwrap_or("<auto>"),
                "no matching child field"
            );
            return false;
        };
        let single = parent_node.slots[slot].arity == SlotArity::Single;

        let displaced = if single {
            parent_node
                .links
                .iter()
                .find(|l| l.slot == slot)
                .map(|l| l.child)
        } else {
            None
        };

        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return false;
        };
        if displaced.is_some() {
            parent_node.links.retain(|l| l.slot != slot);
        }
        parent_node.links.push(ChildLink { slot, child });

        if let Some(old) = displaced {
            if let Some(old_node) = self.nodes.get_mut(old) {
                if let Some(pos) = old_node.parents.iter().position(|&p| p == parent) {
                    old_node.parents.remove(pos);
                }
            }
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parents.push(parent);
        }
        self.parent_added(child, parent);
        true
    }

    /// Detach the first link from `parent` to `child`. Returns false when no
    /// such link exists.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let Some(pos) = parent_node.links.iter().position(|l| l.child == child) else {
            return false;
        };
        parent_node.links.remove(pos);
        if let Some(child_node) = self.nodes.get_mut(child) {
            if let Some(pp) = child_node.parents.iter().position(|&p| p == parent) {
                child_node.parents.remove(pp);
            }
        }
        self.parent_removed(child, parent);
        true
    }

    fn parent_added(&mut self, child: NodeId, parent: NodeId) {
        trace!(?child, ?parent, "child attached");
    }

    fn parent_removed(&mut self, child: NodeId, parent: NodeId) {
        let is_shape = matches!(
            self.nodes.get(child).map(|n| &n.kind),
            Some(NodeKind::Shape(_))
        );
        if is_shape {
            shape::shape_parent_removed(self, child);
            return;
        }
        let _ = parent;
        let children: Vec<NodeId> = self
            .nodes
            .get(child)
            .map(|n| n.children().collect())
            .unwrap_or_default();
        for c in children {
            self.parent_removed(c, child);
        }
    }

    // Field updates

    /// Read a field value.
    pub fn field(&self, id: NodeId, name: &str) -> Option<&FieldValue> {
        self.nodes.get(id).and_then(|n| n.field(name))
    }

    /// Set a declared field to a typed value and run the change hook.
    /// Unknown fields are rejected.
    pub fn set_field(&mut self, id: NodeId, name: &str, value: FieldValue) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        if !node.has_field(name) {
            warn!(node = node.type_name, field = name, "unknown field");
            return false;
        }
        node.store_field(name, value);
        self.field_changed(id, name);
        true
    }

    /// Update a field from declaration text, e.g. a changed attribute.
    ///
    /// The field name matches case-insensitively; the text is parsed as the
    /// field's current kind, with a permissive fallback for booleans and
    /// strings. Runs the change hook, never routes.
    pub fn update_field(&mut self, id: NodeId, name: &str, text: &str) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        let field_name = if node.has_field(name) {
            name.to_string()
        } else {
            match node
                .fields()
                .map(|(k, _)| k)
                .find(|k| k.eq_ignore_ascii_case(name))
            {
                Some(k) => k.to_string(),
                None => {
                    warn!(node = node.type_name, field = name, "unknown field, ignoring update");
                    return false;
                }
            }
        };
        let Some(current) = node.field(&field_name) else {
            return false;
        };
        let value = match current.parse_same_kind(text) {
            Ok(v) => v,
            Err(err) => match current.kind() {
                FieldKind::Bool => FieldValue::Bool(text.trim().eq_ignore_ascii_case("true")),
                FieldKind::String => FieldValue::String(text.to_string()),
                _ => {
                    warn!(
                        node = node.type_name,
                        field = %field_name,
                        %err,
                        "unparseable field update, ignoring"
                    );
                    return false;
                }
            },
        };
        if let Some(node) = self.nodes.get_mut(id) {
            node.store_field(&field_name, value);
        }
        self.field_changed(id, &field_name);
        true
    }

    /// Per-kind reaction to a changed field.
    pub fn field_changed(&mut self, id: NodeId, field: &str) {
        enum Reaction {
            None,
            Transform,
            Bind(bool),
            Material,
            Primitive,
            Composed,
            Property(&'static str, Vec<NodeId>),
        }

        let reaction = {
            let Some(node) = self.nodes.get(id) else {
                return;
            };
            match &node.kind {
                NodeKind::Transform(_) | NodeKind::MatrixTransform(_) => Reaction::Transform,
                NodeKind::Viewpoint
                | NodeKind::NavigationInfo
                | NodeKind::Background
                | NodeKind::Fog
                    if field == "set_bind" =>
                {
                    Reaction::Bind(node.bool_field("set_bind"))
                }
                NodeKind::Material => Reaction::Material,
                NodeKind::Box(_)
                | NodeKind::Sphere(_)
                | NodeKind::Cone(_)
                | NodeKind::Cylinder(_)
                | NodeKind::Torus(_) => Reaction::Primitive,
                NodeKind::IndexedFaceSet(_)
                | NodeKind::IndexedTriangleSet(_)
                | NodeKind::IndexedLineSet(_)
                | NodeKind::PointSet(_) => Reaction::Composed,
                NodeKind::Coordinate
                | NodeKind::Normal
                | NodeKind::Color
                | NodeKind::ColorRgba
                | NodeKind::TextureCoordinate => {
                    match composed::property_notification(&node.kind) {
                        Some(note) => Reaction::Property(note, node.parents().to_vec()),
                        None => Reaction::None,
                    }
                }
                _ => Reaction::None,
            }
        };

        match reaction {
            Reaction::None => {}
            Reaction::Transform => {
                if let Some(node) = self.nodes.get_mut(id) {
                    grouping::refresh_transform(node);
                }
            }
            Reaction::Bind(bind) => self.bind_apply(id, bind),
            Reaction::Material => shape::material_field_changed(self, id),
            Reaction::Primitive => {
                let rebuilt = match self.nodes.get_mut(id) {
                    Some(node) => geometry::refresh_primitive(node, &mut self.geometry_cache),
                    None => false,
                };
                if rebuilt {
                    shape::dirty_parent_shapes(self, id);
                }
            }
            Reaction::Composed => composed::rebuild_geometry(self, id),
            Reaction::Property(note, parents) => {
                for parent in parents {
                    self.field_changed(parent, note);
                }
            }
        }
    }

    /// Setup completion hook, run after a node's subtree is attached.
    pub fn node_changed(&mut self, id: NodeId) {
        enum Reaction {
            None,
            Shape,
            Appearance,
            Composed,
        }
        let reaction = match self.nodes.get(id).map(|n| &n.kind) {
            Some(NodeKind::Shape(_)) => Reaction::Shape,
            Some(NodeKind::Appearance) => Reaction::Appearance,
            Some(
                NodeKind::IndexedFaceSet(_)
                | NodeKind::IndexedTriangleSet(_)
                | NodeKind::IndexedLineSet(_)
                | NodeKind::PointSet(_),
            ) => Reaction::Composed,
            _ => Reaction::None,
        };
        match reaction {
            Reaction::None => {}
            Reaction::Shape => shape::shape_node_changed(self, id),
            Reaction::Appearance => shape::appearance_node_changed(self, id),
            Reaction::Composed => composed::rebuild_geometry(self, id),
        }
    }

    // Queries

    /// First node of the named type in the subtree, depth first, exact type
    /// match. The whole child list is searched, including inactive switch
    /// choices.
    pub fn find(&self, start: NodeId, type_name: &str) -> Option<NodeId> {
        let target = self.registry.lookup(type_name)?;
        self.find_rec(start, target)
    }

    fn find_rec(&self, id: NodeId, target: crate::registry::NodeTypeId) -> Option<NodeId> {
        let node = self.nodes.get(id)?;
        if node.type_id == target {
            return Some(id);
        }
        for child in node.children() {
            if let Some(found) = self.find_rec(child, target) {
                return Some(found);
            }
        }
        None
    }

    /// All nodes of the named type in the subtree, in depth-first order.
    pub fn find_all(&self, start: NodeId, type_name: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(target) = self.registry.lookup(type_name) {
            self.find_all_rec(start, target, &mut out);
        }
        out
    }

    fn find_all_rec(
        &self,
        id: NodeId,
        target: crate::registry::NodeTypeId,
        out: &mut Vec<NodeId>,
    ) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if node.type_id == target {
            out.push(id);
        }
        for child in node.children() {
            self.find_all_rec(child, target, out);
        }
    }

    fn switch_choice(&self, node: &SceneNode) -> Option<NodeId> {
        let which = node.int_field("whichChoice");
        if which < 0 {
            return None;
        }
        node.children().nth(which as usize)
    }

    /// Search a field upward: the node's own fields first, then each parent
    /// recursively in declaration order.
    pub fn find_parent_field(&self, id: NodeId, name: &str) -> Option<FieldValue> {
        self.find_parent_field_with(id, name, |_, _| None)
    }

    /// Like [`find_parent_field`](Self::find_parent_field), with a host
    /// fallback consulted between a node's fields and its parents. Hosts use
    /// it to read raw declaration attributes that never became fields.
    pub fn find_parent_field_with<F>(&self, id: NodeId, name: &str, lookup: F) -> Option<FieldValue>
    where
        F: Fn(ElementKey, &str) -> Option<String> + Copy,
    {
        let node = self.nodes.get(id)?;
        if let Some(value) = node.field(name) {
            return Some(value.clone());
        }
        if let Some(key) = node.element {
            if let Some(text) = lookup(key, name) {
                return Some(FieldValue::String(text));
            }
        }
        for &parent in node.parents() {
            if let Some(value) = self.find_parent_field_with(parent, name, lookup) {
                return Some(value);
            }
        }
        None
    }

    // Transforms

    /// Accumulated transform from the root down to `id`, following parent
    /// links. Returns `None` when any ancestor has several parents, because
    /// the node then sits on more than one path; use
    /// [`transform_along_path`](Self::transform_along_path) to pick one.
    pub fn current_transform(&self, id: NodeId) -> Option<Mat4> {
        let node = self.nodes.get(id)?;
        let local = node.kind.local_matrix();
        match node.parents() {
            [] => Some(local),
            [parent] => self.current_transform(*parent).map(|m| m * local),
            _ => {
                warn!(
                    node = node.type_name,
                    "transform is ambiguous, node is reachable on several paths"
                );
                None
            }
        }
    }

    /// Accumulated transform along an explicit root-to-node path. Returns
    /// `None` when consecutive entries are not parent and child.
    pub fn transform_along_path(&self, path: &[NodeId]) -> Option<Mat4> {
        let mut matrix = Mat4::IDENTITY;
        let mut prev: Option<NodeId> = None;
        for &id in path {
            let node = self.nodes.get(id)?;
            if let Some(parent) = prev {
                if !node.parents().contains(&parent) {
                    warn!(node = node.type_name, "path entries are not parent and child");
                    return None;
                }
            }
            matrix *= node.kind.local_matrix();
            prev = Some(id);
        }
        Some(matrix)
    }

    // Volumes

    /// Bounding box of a subtree in the subtree's own coordinate space.
    /// Transform nodes map their children's volumes; a switch contributes
    /// only its active choice.
    pub fn volume(&self, id: NodeId) -> BoundingBox {
        let Some(node) = self.nodes.get(id) else {
            return BoundingBox::EMPTY;
        };
        if let Some(geom) = node.kind.geom() {
            return *geom.mesh.bounds();
        }
        match &node.kind {
            NodeKind::Shape(_) => node
                .child_in_slot("geometry")
                .map(|g| self.volume(g))
                .unwrap_or(BoundingBox::EMPTY),
            NodeKind::Switch => self
                .switch_choice(node)
                .map(|c| self.volume(c))
                .unwrap_or(BoundingBox::EMPTY),
            NodeKind::Transform(t) | NodeKind::MatrixTransform(t) => {
                let mut bb = BoundingBox::EMPTY;
                for child in node.children() {
                    bb.merge(&self.volume(child));
                }
                bb.transformed(&t.matrix)
            }
            NodeKind::SceneRoot | NodeKind::Group => {
                let mut bb = BoundingBox::EMPTY;
                for child in node.children() {
                    bb.merge(&self.volume(child));
                }
                bb
            }
            _ => BoundingBox::EMPTY,
        }
    }

    // Picking

    /// Nearest pickable hit in the subtree, or `None`. Every candidate is
    /// visited; the result carries the ray parameter and the hit point in
    /// the ray's coordinate space.
    pub fn intersect(&self, root: NodeId, ray: Ray) -> Option<PickResult> {
        let mut best = None;
        self.intersect_rec(root, &ray, &mut best);
        best
    }

    // Returns true when this subtree improved the best hit. A transform maps
    // the ray into its local space on the way down and, when its subtree won,
    // maps the recorded hit point back out. Ray parameters survive the
    // mapping unchanged.
    fn intersect_rec(&self, id: NodeId, ray: &Ray, best: &mut Option<PickResult>) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        match &node.kind {
            NodeKind::Shape(_) => {
                let Some(geom_id) = node.child_in_slot("geometry") else {
                    return false;
                };
                let Some(geom) = self.nodes.get(geom_id).and_then(|n| n.kind.geom()) else {
                    return false;
                };
                if !geom.pickable || !node.bool_field("isPickable") {
                    return false;
                }
                let nearest = best.as_ref().map(|b| b.distance);
                match intersect_mesh(&geom.mesh, ray, nearest) {
                    Some(t) => {
                        *best = Some(PickResult {
                            node: id,
                            point: ray.at(t),
                            distance: t,
                        });
                        true
                    }
                    None => false,
                }
            }
            NodeKind::Transform(t) | NodeKind::MatrixTransform(t) => {
                let local = ray.transformed(&t.matrix.inverse());
                let mut improved = false;
                for child in node.children() {
                    improved |= self.intersect_rec(child, &local, best);
                }
                if improved {
                    if let Some(hit) = best.as_mut() {
                        hit.point = t.matrix.transform_point3(hit.point);
                    }
                }
                improved
            }
            NodeKind::Switch => match self.switch_choice(node) {
                Some(choice) => self.intersect_rec(choice, ray, best),
                None => false,
            },
            NodeKind::SceneRoot | NodeKind::Group => {
                let mut improved = false;
                for child in node.children() {
                    improved |= self.intersect_rec(child, ray, best);
                }
                improved
            }
            _ => false,
        }
    }

    /// The shape a pick id maps to, as read back from an id render pass.
    pub fn pick_target(&self, pick_id: u32) -> Option<NodeId> {
        self.pick_map.get(&pick_id).copied()
    }

    pub(crate) fn release_pick_id(&mut self, pick_id: u32) {
        self.pick_map.remove(&pick_id);
    }

    // Drawable collection

    /// Flatten the renderable shapes of a subtree with their accumulated
    /// transforms, honoring switch choices and the `render` flag. Pickable
    /// shapes without a pick id are assigned one.
    pub fn collect_drawables(&mut self, root: NodeId) -> Vec<Drawable> {
        let mut out = Vec::new();
        self.collect_rec(root, Mat4::IDENTITY, &mut out);
        for drawable in &out {
            self.assign_pick_id(drawable.shape);
        }
        out
    }

    fn collect_rec(&self, id: NodeId, matrix: Mat4, out: &mut Vec<Drawable>) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        // The render flag hides shapes and whole grouping subtrees alike.
        if !node.bool_field("render") {
            return;
        }
        match &node.kind {
            NodeKind::Shape(_) => {
                out.push(Drawable {
                    transform: matrix,
                    shape: id,
                });
            }
            NodeKind::Transform(t) | NodeKind::MatrixTransform(t) => {
                let matrix = matrix * t.matrix;
                for child in node.children() {
                    self.collect_rec(child, matrix, out);
                }
            }
            NodeKind::Switch => {
                if let Some(choice) = self.switch_choice(node) {
                    self.collect_rec(choice, matrix, out);
                }
            }
            NodeKind::SceneRoot | NodeKind::Group => {
                for child in node.children() {
                    self.collect_rec(child, matrix, out);
                }
            }
            _ => {}
        }
    }

    fn assign_pick_id(&mut self, shape: NodeId) {
        let pickable = match self.nodes.get(shape) {
            Some(node) => {
                node.bool_field("isPickable")
                    && node
                        .child_in_slot("geometry")
                        .and_then(|g| self.nodes.get(g))
                        .and_then(|n| n.kind.geom())
                        .map(|g| g.pickable)
                        .unwrap_or(false)
            }
            None => false,
        };
        if !pickable {
            return;
        }
        let next = self.next_pick_id;
        let Some(state) = self.nodes.get_mut(shape).and_then(|n| n.kind.shape_mut()) else {
            return;
        };
        if state.pick_id.is_some() {
            return;
        }
        state.pick_id = Some(next);
        self.pick_map.insert(next, shape);
        self.next_pick_id += 1;
    }

    // Renderer resource plumbing

    /// Attach renderer resources to a shape. A previously attached handle is
    /// retired.
    pub fn attach_render_handle(&mut self, shape: NodeId, handle: RenderHandle) -> bool {
        match self.nodes.get_mut(shape).and_then(|n| n.kind.shape_mut()) {
            Some(state) => {
                if let Some(old) = state.render_handle.replace(handle) {
                    self.retired.push(old);
                }
                true
            }
            None => false,
        }
    }

    /// Clear a shape's dirty flags after upload.
    pub fn mark_shape_clean(&mut self, shape: NodeId) {
        if let Some(state) = self.nodes.get_mut(shape).and_then(|n| n.kind.shape_mut()) {
            state.geometry_dirty = false;
            state.material_dirty = false;
        }
    }

    /// Handles whose owning shapes went away, for the renderer to free.
    pub fn drain_retired(&mut self) -> Vec<RenderHandle> {
        std::mem::take(&mut self.retired)
    }

    pub(crate) fn retire_render_handle(&mut self, handle: RenderHandle) {
        self.retired.push(handle);
    }
}

fn intersect_mesh(mesh: &Mesh, ray: &Ray, nearest: Option<f32>) -> Option<f32> {
    if mesh.primitive != Primitive::Triangles {
        return None;
    }
    if !intersect_aabb(ray, mesh.bounds()) {
        return None;
    }
    let mut nearest = nearest;
    let mut improved = None;
    for part in &mesh.parts {
        for tri in part.indices.chunks_exact(3) {
            let (Some(&a), Some(&b), Some(&c)) = (
                part.positions.get(tri[0] as usize),
                part.positions.get(tri[1] as usize),
                part.positions.get(tri[2] as usize),
            ) else {
                continue;
            };
            if let Some(t) = intersect_triangle(ray, a, b, c) {
                if nearest.map_or(true, |n| t < n) {
                    nearest = Some(t);
                    improved = Some(t);
                }
            }
        }
    }
    improved
}
