//! Typed field values for declarative scene nodes.
//!
//! Every node field holds one [`FieldValue`]. The variant set is closed and
//! mirrors the declarative field types: single values (`SF*` in the markup
//! tradition) and multi values (`MF*`). [`FieldKind`] names the type without
//! carrying a value and owns the text parsers (see [`parse`]).

mod parse;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// Inline image data: dimensions, component count and packed integer pixels.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageValue {
    pub width: u32,
    pub height: u32,
    /// Components per pixel (1-4).
    pub components: u32,
    /// One packed integer per pixel, as written in the source attribute.
    pub pixels: Vec<u32>,
}

/// The type of a field, without a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Double,
    String,
    Color,
    ColorRgba,
    Vec2,
    Vec3,
    Rotation,
    Matrix,
    Image,
    Ints,
    Floats,
    Strings,
    Colors,
    ColorsRgba,
    Vec2s,
    Vec3s,
    Rotations,
}

/// A typed field value.
///
/// Colors are carried as `Vec3`/`Vec4` but keep their own variants so that
/// reparsing and serialization stay faithful to the declared field type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum FieldValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Double(f64),
    String(String),
    Color(Vec3),
    ColorRgba(Vec4),
    Vec2(Vec2),
    Vec3(Vec3),
    Rotation(Quat),
    Matrix(Mat4),
    Image(ImageValue),
    Ints(Vec<i32>),
    Floats(Vec<f32>),
    Strings(Vec<String>),
    Colors(Vec<Vec3>),
    ColorsRgba(Vec<Vec4>),
    Vec2s(Vec<Vec2>),
    Vec3s(Vec<Vec3>),
    Rotations(Vec<Quat>),
}

impl FieldValue {
    /// The kind of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Float(_) => FieldKind::Float,
            FieldValue::Double(_) => FieldKind::Double,
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Color(_) => FieldKind::Color,
            FieldValue::ColorRgba(_) => FieldKind::ColorRgba,
            FieldValue::Vec2(_) => FieldKind::Vec2,
            FieldValue::Vec3(_) => FieldKind::Vec3,
            FieldValue::Rotation(_) => FieldKind::Rotation,
            FieldValue::Matrix(_) => FieldKind::Matrix,
            FieldValue::Image(_) => FieldKind::Image,
            FieldValue::Ints(_) => FieldKind::Ints,
            FieldValue::Floats(_) => FieldKind::Floats,
            FieldValue::Strings(_) => FieldKind::Strings,
            FieldValue::Colors(_) => FieldKind::Colors,
            FieldValue::ColorsRgba(_) => FieldKind::ColorsRgba,
            FieldValue::Vec2s(_) => FieldKind::Vec2s,
            FieldValue::Vec3s(_) => FieldKind::Vec3s,
            FieldValue::Rotations(_) => FieldKind::Rotations,
        }
    }

    /// Reparse `text` with this value's own kind.
    ///
    /// This is the runtime-update path: the existing value decides the
    /// grammar, the result replaces it on success.
    pub fn parse_same_kind(&self, text: &str) -> Result<FieldValue, FieldError> {
        self.kind().parse(text)
    }

    /// Get as bool, if this is a Bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32, if this is an Int value.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            FieldValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f32. Int and Double values convert.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Double(d) => Some(*d as f32),
            FieldValue::Int(i) => Some(*i as f32),
            _ => None,
        }
    }

    /// Get as f64. Float and Int values convert.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            FieldValue::Double(d) => Some(*d),
            FieldValue::Float(f) => Some(*f as f64),
            FieldValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as &str, if this is a String value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as Vec2, if this is a Vec2 value.
    pub fn as_vec2(&self) -> Option<Vec2> {
        match self {
            FieldValue::Vec2(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vec3. Color values convert.
    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            FieldValue::Vec3(v) | FieldValue::Color(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Vec4. ColorRgba values convert.
    pub fn as_vec4(&self) -> Option<Vec4> {
        match self {
            FieldValue::ColorRgba(v) => Some(*v),
            _ => None,
        }
    }

    /// Get as Quat, if this is a Rotation value.
    pub fn as_rotation(&self) -> Option<Quat> {
        match self {
            FieldValue::Rotation(q) => Some(*q),
            _ => None,
        }
    }

    /// Get as Mat4, if this is a Matrix value.
    pub fn as_matrix(&self) -> Option<Mat4> {
        match self {
            FieldValue::Matrix(m) => Some(*m),
            _ => None,
        }
    }

    /// Get the int list, if this is an Ints value.
    pub fn as_ints(&self) -> Option<&[i32]> {
        match self {
            FieldValue::Ints(v) => Some(v),
            _ => None,
        }
    }

    /// Get the float list, if this is a Floats value.
    pub fn as_floats(&self) -> Option<&[f32]> {
        match self {
            FieldValue::Floats(v) => Some(v),
            _ => None,
        }
    }

    /// Get the string list, if this is a Strings value.
    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            FieldValue::Strings(v) => Some(v),
            _ => None,
        }
    }

    /// Get the Vec2 list, if this is a Vec2s value.
    pub fn as_vec2s(&self) -> Option<&[Vec2]> {
        match self {
            FieldValue::Vec2s(v) => Some(v),
            _ => None,
        }
    }

    /// Get the Vec3 list. Colors convert.
    pub fn as_vec3s(&self) -> Option<&[Vec3]> {
        match self {
            FieldValue::Vec3s(v) | FieldValue::Colors(v) => Some(v),
            _ => None,
        }
    }

    /// Get the Vec4 list, if this is a ColorsRgba value.
    pub fn as_vec4s(&self) -> Option<&[Vec4]> {
        match self {
            FieldValue::ColorsRgba(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

impl From<Vec2> for FieldValue {
    fn from(v: Vec2) -> Self {
        FieldValue::Vec2(v)
    }
}

impl From<Vec3> for FieldValue {
    fn from(v: Vec3) -> Self {
        FieldValue::Vec3(v)
    }
}

impl From<Quat> for FieldValue {
    fn from(v: Quat) -> Self {
        FieldValue::Rotation(v)
    }
}

impl From<Mat4> for FieldValue {
    fn from(v: Mat4) -> Self {
        FieldValue::Matrix(v)
    }
}
