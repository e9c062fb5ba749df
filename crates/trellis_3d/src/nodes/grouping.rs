//! Transform-bearing grouping nodes.

use glam::{Mat4, Quat, Vec3};

use crate::mesh::GeometryCache;
use crate::node::{NodeClass, NodeInit, SceneNode};
use crate::registry::NodeDescriptor;

use super::{NodeKind, TransformState, TRANSFORM};

pub const TRANSFORM_NODE: NodeDescriptor = NodeDescriptor {
    name: "Transform",
    component: "Grouping",
    classes: TRANSFORM,
    build: build_transform,
};

fn build_transform(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    init.bool_field("render", true);
    init.vec3_field("center", Vec3::ZERO);
    init.vec3_field("translation", Vec3::ZERO);
    init.rotation_field("rotation", Quat::IDENTITY);
    init.vec3_field("scale", Vec3::ONE);
    init.rotation_field("scaleOrientation", Quat::IDENTITY);
    init.many("children", NodeClass::Child);
    NodeKind::Transform(TransformState {
        matrix: compose_transform(
            init.get_vec3("center"),
            init.get_vec3("translation"),
            init.get_rotation("rotation"),
            init.get_vec3("scale"),
            init.get_rotation("scaleOrientation"),
        ),
    })
}

pub const MATRIX_TRANSFORM: NodeDescriptor = NodeDescriptor {
    name: "MatrixTransform",
    component: "Grouping",
    classes: TRANSFORM,
    build: build_matrix_transform,
};

fn build_matrix_transform(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    init.bool_field("render", true);
    init.matrix_field("matrix", Mat4::IDENTITY);
    init.many("children", NodeClass::Child);
    NodeKind::MatrixTransform(TransformState {
        matrix: init.get_matrix("matrix"),
    })
}

/// The standard transform composition:
/// `T * C * R * SR * S * SR^-1 * C^-1`.
pub fn compose_transform(
    center: Vec3,
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
    scale_orientation: Quat,
) -> Mat4 {
    Mat4::from_translation(translation)
        * Mat4::from_translation(center)
        * Mat4::from_quat(rotation)
        * Mat4::from_quat(scale_orientation)
        * Mat4::from_scale(scale)
        * Mat4::from_quat(scale_orientation.inverse())
        * Mat4::from_translation(-center)
}

/// Recompute the cached local matrix after a field change.
pub(crate) fn refresh_transform(node: &mut SceneNode) {
    let matrix = match &node.kind {
        NodeKind::Transform(_) => compose_transform(
            node.vec3_field("center"),
            node.vec3_field("translation"),
            node.rotation_field("rotation"),
            node.vec3_field("scale"),
            node.rotation_field("scaleOrientation"),
        ),
        NodeKind::MatrixTransform(_) => node.matrix_field("matrix"),
        _ => return,
    };
    if let NodeKind::Transform(t) | NodeKind::MatrixTransform(t) = &mut node.kind {
        t.matrix = matrix;
    }
}
