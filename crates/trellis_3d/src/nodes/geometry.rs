//! Primitive geometry nodes.
//!
//! Primitives with equal parameters share one mesh through the geometry
//! cache; the cache key encodes the type name and every shape parameter.

use glam::Vec3;

use crate::mesh::{
    BoxGeometry, ConeGeometry, CylinderGeometry, GeometryCache, SphereGeometry, TorusGeometry,
};
use crate::node::{NodeInit, SceneNode};
use crate::registry::NodeDescriptor;

use super::{GeomState, NodeKind, GEOMETRY};

pub(crate) fn geometry_common(init: &mut NodeInit) {
    init.bool_field("solid", true);
    init.bool_field("ccw", true);
}

pub const BOX: NodeDescriptor = NodeDescriptor {
    name: "Box",
    component: "Geometry3D",
    classes: GEOMETRY,
    build: build_box,
};

fn build_box(init: &mut NodeInit, cache: &mut GeometryCache) -> NodeKind {
    geometry_common(init);
    init.vec3_field("size", Vec3::splat(2.0));
    let size = init.get_vec3("size");
    NodeKind::Box(GeomState {
        mesh: cache.get_or_insert_with(&box_key(size), || BoxGeometry::new(size)),
        pickable: true,
    })
}

fn box_key(size: Vec3) -> String {
    format!("Box_{}-{}-{}", size.x, size.y, size.z)
}

pub const SPHERE: NodeDescriptor = NodeDescriptor {
    name: "Sphere",
    component: "Geometry3D",
    classes: GEOMETRY,
    build: build_sphere,
};

fn build_sphere(init: &mut NodeInit, cache: &mut GeometryCache) -> NodeKind {
    geometry_common(init);
    init.float_field("radius", 1.0);
    let radius = init.get_float("radius");
    NodeKind::Sphere(GeomState {
        mesh: cache.get_or_insert_with(&format!("Sphere_{radius}"), || {
            SphereGeometry::new(radius)
        }),
        pickable: true,
    })
}

pub const CONE: NodeDescriptor = NodeDescriptor {
    name: "Cone",
    component: "Geometry3D",
    classes: GEOMETRY,
    build: build_cone,
};

fn build_cone(init: &mut NodeInit, cache: &mut GeometryCache) -> NodeKind {
    geometry_common(init);
    init.float_field("bottomRadius", 1.0);
    init.float_field("height", 2.0);
    init.bool_field("side", true);
    init.bool_field("bottom", true);
    let (r, h) = (init.get_float("bottomRadius"), init.get_float("height"));
    let (side, bottom) = (init.get_bool("side"), init.get_bool("bottom"));
    NodeKind::Cone(GeomState {
        mesh: cache.get_or_insert_with(&format!("Cone_{r}-{h}-{side}-{bottom}"), || {
            ConeGeometry::new(r, h, side, bottom)
        }),
        pickable: true,
    })
}

pub const CYLINDER: NodeDescriptor = NodeDescriptor {
    name: "Cylinder",
    component: "Geometry3D",
    classes: GEOMETRY,
    build: build_cylinder,
};

fn build_cylinder(init: &mut NodeInit, cache: &mut GeometryCache) -> NodeKind {
    geometry_common(init);
    init.float_field("radius", 1.0);
    init.float_field("height", 2.0);
    init.bool_field("side", true);
    init.bool_field("top", true);
    init.bool_field("bottom", true);
    let (r, h) = (init.get_float("radius"), init.get_float("height"));
    let (side, top, bottom) = (
        init.get_bool("side"),
        init.get_bool("top"),
        init.get_bool("bottom"),
    );
    NodeKind::Cylinder(GeomState {
        mesh: cache.get_or_insert_with(&format!("Cylinder_{r}-{h}-{side}-{top}-{bottom}"), || {
            CylinderGeometry::new(r, h, side, top, bottom)
        }),
        pickable: true,
    })
}

pub const TORUS: NodeDescriptor = NodeDescriptor {
    name: "Torus",
    component: "Geometry3D",
    classes: GEOMETRY,
    build: build_torus,
};

fn build_torus(init: &mut NodeInit, cache: &mut GeometryCache) -> NodeKind {
    geometry_common(init);
    init.float_field("innerRadius", 0.5);
    init.float_field("outerRadius", 1.0);
    let (inner, outer) = (init.get_float("innerRadius"), init.get_float("outerRadius"));
    NodeKind::Torus(GeomState {
        mesh: cache.get_or_insert_with(&format!("Torus_{inner}-{outer}"), || {
            TorusGeometry::new(inner, outer)
        }),
        pickable: true,
    })
}

/// Rebuild a primitive's mesh after one of its shape parameters changed.
/// Returns false for non-primitive kinds.
pub(crate) fn refresh_primitive(node: &mut SceneNode, cache: &mut GeometryCache) -> bool {
    let mesh = match &node.kind {
        NodeKind::Box(_) => {
            let size = node.vec3_field("size");
            cache.get_or_insert_with(&box_key(size), || BoxGeometry::new(size))
        }
        NodeKind::Sphere(_) => {
            let radius = node.float_field("radius");
            cache.get_or_insert_with(&format!("Sphere_{radius}"), || SphereGeometry::new(radius))
        }
        NodeKind::Cone(_) => {
            let (r, h) = (node.float_field("bottomRadius"), node.float_field("height"));
            let (side, bottom) = (node.bool_field("side"), node.bool_field("bottom"));
            cache.get_or_insert_with(&format!("Cone_{r}-{h}-{side}-{bottom}"), || {
                ConeGeometry::new(r, h, side, bottom)
            })
        }
        NodeKind::Cylinder(_) => {
            let (r, h) = (node.float_field("radius"), node.float_field("height"));
            let (side, top, bottom) = (
                node.bool_field("side"),
                node.bool_field("top"),
                node.bool_field("bottom"),
            );
            cache.get_or_insert_with(&format!("Cylinder_{r}-{h}-{side}-{top}-{bottom}"), || {
                CylinderGeometry::new(r, h, side, top, bottom)
            })
        }
        NodeKind::Torus(_) => {
            let (inner, outer) = (
                node.float_field("innerRadius"),
                node.float_field("outerRadius"),
            );
            cache.get_or_insert_with(&format!("Torus_{inner}-{outer}"), || {
                TorusGeometry::new(inner, outer)
            })
        }
        _ => return false,
    };
    if let Some(geom) = node.kind.geom_mut() {
        geom.mesh = mesh;
    }
    true
}
