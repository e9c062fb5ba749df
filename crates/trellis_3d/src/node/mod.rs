//! The node base: identity, fields, child slots, and parents.
//!
//! Behavior lives in the graph-level dispatch (`graph` module) and per-kind
//! state in [`NodeKind`](crate::nodes::NodeKind); this module is the uniform
//! record every node shares.

mod init;

pub use init::NodeInit;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use indexmap::IndexMap;
use smallvec::SmallVec;
use trellis_core::element::ElementKey;
use trellis_core::field::FieldValue;

use crate::namespace::SpaceId;
use crate::nodes::NodeKind;
use crate::registry::NodeTypeId;

slotmap::new_key_type! {
    /// Arena key for scene nodes.
    pub struct NodeId;
}

/// Capability classes, replacing an inheritance hierarchy.
///
/// Every node declares the full list of classes it belongs to; a child slot
/// accepts any node whose list contains the slot's class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeClass {
    /// Every node.
    Node,
    /// May appear under a grouping node.
    Child,
    /// Has a `children` slot of its own.
    Grouping,
    /// Carries a local transform.
    Transform,
    Shape,
    Geometry,
    /// Attribute data consumed by composed geometry.
    GeometricProperty,
    Coordinate,
    Normal,
    Color,
    TextureCoordinate,
    Appearance,
    Material,
    /// Participates in a bindable stack.
    Bindable,
    Metadata,
}

/// How many children a slot holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotArity {
    Single,
    Many,
}

/// A declared child field: name, accepted class, arity.
#[derive(Clone, Copy, Debug)]
pub struct ChildSlot {
    pub name: &'static str,
    pub accepts: NodeClass,
    pub arity: SlotArity,
}

/// One parent-to-child link. The link list is the authoritative child
/// storage; the flat child list is derived from it in attach order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildLink {
    pub slot: usize,
    pub child: NodeId,
}

/// A node in the scene graph.
pub struct SceneNode {
    pub type_id: NodeTypeId,
    pub type_name: &'static str,
    pub classes: &'static [NodeClass],
    /// DEF name (or element id) this node was registered under.
    pub def_name: Option<String>,
    pub space: Option<SpaceId>,
    /// Declarative element this node was built from, if any.
    pub element: Option<ElementKey>,
    /// True for nodes the runtime synthesized (defaults), not declared ones.
    pub auto_gen: bool,
    pub(crate) fields: IndexMap<String, FieldValue>,
    pub(crate) slots: Vec<ChildSlot>,
    pub(crate) links: Vec<ChildLink>,
    pub(crate) parents: SmallVec<[NodeId; 4]>,
    pub kind: NodeKind,
}

impl SceneNode {
    /// Whether this node belongs to `class`.
    pub fn is_a(&self, class: NodeClass) -> bool {
        self.classes.contains(&class)
    }

    /// Value field by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All value fields in registration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Declared child slots in declaration order.
    pub fn slots(&self) -> &[ChildSlot] {
        &self.slots
    }

    /// Authoritative child links in attach order.
    pub fn links(&self) -> &[ChildLink] {
        &self.links
    }

    /// Flat child list, derived from the links.
    pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.links.iter().map(|l| l.child)
    }

    /// Children attached to the named slot.
    pub fn children_in_slot<'a>(&'a self, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        let slot = self.slot_index(name);
        self.links
            .iter()
            .filter(move |l| Some(l.slot) == slot)
            .map(|l| l.child)
    }

    /// First child in the named slot.
    pub fn child_in_slot(&self, name: &str) -> Option<NodeId> {
        self.children_in_slot(name).next()
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parents
    }

    pub(crate) fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    /// Replace a field value without any notification. Creates the field if
    /// it does not exist, mirroring untyped message delivery.
    pub(crate) fn store_field(&mut self, name: &str, value: FieldValue) {
        if let Some(slot) = self.fields.get_mut(name) {
            *slot = value;
        } else {
            self.fields.insert(name.to_string(), value);
        }
    }

    // Typed field readers with defaults, for kind-level code that knows its
    // registered fields.

    pub fn bool_field(&self, name: &str) -> bool {
        self.field(name).and_then(FieldValue::as_bool).unwrap_or(false)
    }

    pub fn int_field(&self, name: &str) -> i32 {
        self.field(name).and_then(FieldValue::as_int).unwrap_or(0)
    }

    pub fn float_field(&self, name: &str) -> f32 {
        self.field(name).and_then(FieldValue::as_float).unwrap_or(0.0)
    }

    pub fn str_field(&self, name: &str) -> &str {
        self.field(name).and_then(FieldValue::as_str).unwrap_or("")
    }

    pub fn vec3_field(&self, name: &str) -> Vec3 {
        self.field(name).and_then(FieldValue::as_vec3).unwrap_or(Vec3::ZERO)
    }

    pub fn rotation_field(&self, name: &str) -> Quat {
        self.field(name)
            .and_then(FieldValue::as_rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    pub fn matrix_field(&self, name: &str) -> Mat4 {
        self.field(name)
            .and_then(FieldValue::as_matrix)
            .unwrap_or(Mat4::IDENTITY)
    }

    pub fn ints_field(&self, name: &str) -> &[i32] {
        self.field(name).and_then(FieldValue::as_ints).unwrap_or(&[])
    }

    pub fn floats_field(&self, name: &str) -> &[f32] {
        self.field(name).and_then(FieldValue::as_floats).unwrap_or(&[])
    }

    pub fn strings_field(&self, name: &str) -> &[String] {
        self.field(name).and_then(FieldValue::as_strings).unwrap_or(&[])
    }

    pub fn vec2s_field(&self, name: &str) -> &[Vec2] {
        self.field(name).and_then(FieldValue::as_vec2s).unwrap_or(&[])
    }

    pub fn vec3s_field(&self, name: &str) -> &[Vec3] {
        self.field(name).and_then(FieldValue::as_vec3s).unwrap_or(&[])
    }

    pub fn vec4s_field(&self, name: &str) -> &[Vec4] {
        self.field(name).and_then(FieldValue::as_vec4s).unwrap_or(&[])
    }
}
