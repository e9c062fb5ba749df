//! Field and slot registration at node construction.
//!
//! A node descriptor's build function receives a [`NodeInit`] and declares
//! its value fields and child slots in order. Each value field takes its
//! initial value from the declaration attribute of the same name when one is
//! present and parses; otherwise the default applies and a parse failure is
//! logged.

use glam::{Mat4, Quat, Vec2, Vec3};
use indexmap::IndexMap;
use tracing::warn;
use trellis_core::element::SceneElement;
use trellis_core::field::{FieldKind, FieldValue};

use super::{ChildSlot, NodeClass, SlotArity};

pub struct NodeInit<'a> {
    type_name: &'static str,
    element: Option<&'a dyn SceneElement>,
    fields: IndexMap<String, FieldValue>,
    slots: Vec<ChildSlot>,
}

impl<'a> NodeInit<'a> {
    pub(crate) fn new(type_name: &'static str, element: Option<&'a dyn SceneElement>) -> Self {
        Self {
            type_name,
            element,
            fields: IndexMap::new(),
            slots: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> (IndexMap<String, FieldValue>, Vec<ChildSlot>) {
        (self.fields, self.slots)
    }

    /// Register a value field of the given kind.
    pub fn field(&mut self, name: &str, kind: FieldKind, default: FieldValue) {
        let value = match self.element.and_then(|e| e.attribute(name)) {
            Some(text) => match kind.parse(text) {
                Ok(v) => v,
                Err(err) => {
                    warn!(
                        node = self.type_name,
                        field = name,
                        %err,
                        "bad attribute value, using default"
                    );
                    default
                }
            },
            None => default,
        };
        self.fields.insert(name.to_string(), value);
    }

    pub fn bool_field(&mut self, name: &str, default: bool) {
        self.field(name, FieldKind::Bool, FieldValue::Bool(default));
    }

    pub fn int_field(&mut self, name: &str, default: i32) {
        self.field(name, FieldKind::Int, FieldValue::Int(default));
    }

    pub fn float_field(&mut self, name: &str, default: f32) {
        self.field(name, FieldKind::Float, FieldValue::Float(default));
    }

    pub fn string_field(&mut self, name: &str, default: &str) {
        self.field(name, FieldKind::String, FieldValue::String(default.to_string()));
    }

    pub fn color_field(&mut self, name: &str, default: Vec3) {
        self.field(name, FieldKind::Color, FieldValue::Color(default));
    }

    pub fn vec2_field(&mut self, name: &str, default: Vec2) {
        self.field(name, FieldKind::Vec2, FieldValue::Vec2(default));
    }

    pub fn vec3_field(&mut self, name: &str, default: Vec3) {
        self.field(name, FieldKind::Vec3, FieldValue::Vec3(default));
    }

    pub fn rotation_field(&mut self, name: &str, default: Quat) {
        self.field(name, FieldKind::Rotation, FieldValue::Rotation(default));
    }

    pub fn matrix_field(&mut self, name: &str, default: Mat4) {
        self.field(name, FieldKind::Matrix, FieldValue::Matrix(default));
    }

    pub fn ints_field(&mut self, name: &str, default: &[i32]) {
        self.field(name, FieldKind::Ints, FieldValue::Ints(default.to_vec()));
    }

    pub fn floats_field(&mut self, name: &str, default: &[f32]) {
        self.field(name, FieldKind::Floats, FieldValue::Floats(default.to_vec()));
    }

    pub fn strings_field(&mut self, name: &str, default: &[&str]) {
        self.field(
            name,
            FieldKind::Strings,
            FieldValue::Strings(default.iter().map(|s| s.to_string()).collect()),
        );
    }

    pub fn colors_field(&mut self, name: &str, default: &[Vec3]) {
        self.field(name, FieldKind::Colors, FieldValue::Colors(default.to_vec()));
    }

    pub fn vec2s_field(&mut self, name: &str, default: &[Vec2]) {
        self.field(name, FieldKind::Vec2s, FieldValue::Vec2s(default.to_vec()));
    }

    pub fn vec3s_field(&mut self, name: &str, default: &[Vec3]) {
        self.field(name, FieldKind::Vec3s, FieldValue::Vec3s(default.to_vec()));
    }

    /// Declare a single-child slot.
    pub fn single(&mut self, name: &'static str, accepts: NodeClass) {
        self.slots.push(ChildSlot { name, accepts, arity: SlotArity::Single });
    }

    /// Declare a multi-child slot.
    pub fn many(&mut self, name: &'static str, accepts: NodeClass) {
        self.slots.push(ChildSlot { name, accepts, arity: SlotArity::Many });
    }

    // Read-back for build functions that derive state from parsed fields.

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).and_then(FieldValue::as_bool).unwrap_or(false)
    }

    pub fn get_float(&self, name: &str) -> f32 {
        self.get(name).and_then(FieldValue::as_float).unwrap_or(0.0)
    }

    pub fn get_vec3(&self, name: &str) -> Vec3 {
        self.get(name).and_then(FieldValue::as_vec3).unwrap_or(Vec3::ZERO)
    }

    pub fn get_rotation(&self, name: &str) -> Quat {
        self.get(name)
            .and_then(FieldValue::as_rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    pub fn get_matrix(&self, name: &str) -> Mat4 {
        self.get(name)
            .and_then(FieldValue::as_matrix)
            .unwrap_or(Mat4::IDENTITY)
    }

    pub fn get_str(&self, name: &str) -> &str {
        self.get(name).and_then(FieldValue::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::element::DeclElement;

    #[test]
    fn test_attribute_overrides_default() {
        let el = DeclElement::new("Box").with_attr("size", "1 2 3");
        let mut init = NodeInit::new("Box", Some(&el));
        init.vec3_field("size", Vec3::splat(2.0));
        assert_eq!(init.get_vec3("size"), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_bad_attribute_falls_back() {
        let el = DeclElement::new("Box").with_attr("size", "big");
        let mut init = NodeInit::new("Box", Some(&el));
        init.vec3_field("size", Vec3::splat(2.0));
        assert_eq!(init.get_vec3("size"), Vec3::splat(2.0));
    }

    #[test]
    fn test_registration_order_kept() {
        let mut init = NodeInit::new("Material", None);
        init.float_field("ambientIntensity", 0.2);
        init.color_field("diffuseColor", Vec3::splat(0.8));
        init.float_field("transparency", 0.0);
        let (fields, _) = init.finish();
        let names: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["ambientIntensity", "diffuseColor", "transparency"]);
    }
}
