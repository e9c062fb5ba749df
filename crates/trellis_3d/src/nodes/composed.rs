//! Composed geometry (indexed sets, point clouds) and the geometric
//! property nodes feeding them.

use std::sync::Arc;

use glam::{Vec2, Vec3, Vec4};

use crate::graph::SceneGraph;
use crate::mesh::{
    build_indexed_faces, build_indexed_lines, build_point_cloud, GeometryCache, IndexedFaceInput,
    IndexedLineInput, Mesh, Primitive, TexGenMode,
};
use crate::node::{NodeClass, NodeId, NodeInit};
use crate::registry::NodeDescriptor;

use super::geometry::geometry_common;
use super::{shape, GeomState, NodeKind, COLOR, COORDINATE, GEOMETRY, NORMAL, TEX_COORD};

use trellis_core::field::{FieldKind, FieldValue};

fn empty_geom(primitive: Primitive, pickable: bool) -> GeomState {
    GeomState {
        mesh: Arc::new(Mesh::empty(primitive)),
        pickable,
    }
}

fn composed_slots(init: &mut NodeInit) {
    init.single("coord", NodeClass::Coordinate);
    init.single("normal", NodeClass::Normal);
    init.single("color", NodeClass::Color);
    init.single("texCoord", NodeClass::TextureCoordinate);
}

pub const INDEXED_FACE_SET: NodeDescriptor = NodeDescriptor {
    name: "IndexedFaceSet",
    component: "Geometry3D",
    classes: GEOMETRY,
    build: build_indexed_face_set,
};

fn build_indexed_face_set(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    geometry_common(init);
    init.bool_field("normalPerVertex", true);
    init.bool_field("colorPerVertex", true);
    init.float_field("creaseAngle", 0.0);
    init.ints_field("coordIndex", &[]);
    init.ints_field("normalIndex", &[]);
    init.ints_field("texCoordIndex", &[]);
    init.ints_field("colorIndex", &[]);
    composed_slots(init);
    NodeKind::IndexedFaceSet(empty_geom(Primitive::Triangles, true))
}

pub const INDEXED_TRIANGLE_SET: NodeDescriptor = NodeDescriptor {
    name: "IndexedTriangleSet",
    component: "Rendering",
    classes: GEOMETRY,
    build: build_indexed_triangle_set,
};

fn build_indexed_triangle_set(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    geometry_common(init);
    init.bool_field("normalPerVertex", true);
    init.bool_field("colorPerVertex", true);
    init.ints_field("index", &[]);
    composed_slots(init);
    NodeKind::IndexedTriangleSet(empty_geom(Primitive::Triangles, true))
}

pub const INDEXED_LINE_SET: NodeDescriptor = NodeDescriptor {
    name: "IndexedLineSet",
    component: "Rendering",
    classes: GEOMETRY,
    build: build_indexed_line_set,
};

fn build_indexed_line_set(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    geometry_common(init);
    init.bool_field("colorPerVertex", true);
    init.ints_field("coordIndex", &[]);
    init.ints_field("colorIndex", &[]);
    init.single("coord", NodeClass::Coordinate);
    init.single("color", NodeClass::Color);
    NodeKind::IndexedLineSet(empty_geom(Primitive::Lines, false))
}

pub const POINT_SET: NodeDescriptor = NodeDescriptor {
    name: "PointSet",
    component: "Rendering",
    classes: GEOMETRY,
    build: build_point_set,
};

fn build_point_set(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    geometry_common(init);
    init.single("coord", NodeClass::Coordinate);
    init.single("color", NodeClass::Color);
    NodeKind::PointSet(empty_geom(Primitive::Points, false))
}

pub const COORDINATE_NODE: NodeDescriptor = NodeDescriptor {
    name: "Coordinate",
    component: "Rendering",
    classes: COORDINATE,
    build: |init, _| {
        init.vec3s_field("point", &[]);
        NodeKind::Coordinate
    },
};

pub const NORMAL_NODE: NodeDescriptor = NodeDescriptor {
    name: "Normal",
    component: "Rendering",
    classes: NORMAL,
    build: |init, _| {
        init.vec3s_field("vector", &[]);
        NodeKind::Normal
    },
};

pub const COLOR_NODE: NodeDescriptor = NodeDescriptor {
    name: "Color",
    component: "Rendering",
    classes: COLOR,
    build: |init, _| {
        init.field("color", FieldKind::Colors, FieldValue::Colors(Vec::new()));
        NodeKind::Color
    },
};

pub const COLOR_RGBA_NODE: NodeDescriptor = NodeDescriptor {
    name: "ColorRGBA",
    component: "Rendering",
    classes: COLOR,
    build: |init, _| {
        init.field(
            "color",
            FieldKind::ColorsRgba,
            FieldValue::ColorsRgba(Vec::new()),
        );
        NodeKind::ColorRgba
    },
};

pub const TEXTURE_COORDINATE: NodeDescriptor = NodeDescriptor {
    name: "TextureCoordinate",
    component: "Texturing",
    classes: TEX_COORD,
    build: |init, _| {
        init.vec2s_field("point", &[]);
        NodeKind::TextureCoordinate
    },
};

pub const TEXTURE_COORDINATE_GENERATOR: NodeDescriptor = NodeDescriptor {
    name: "TextureCoordinateGenerator",
    component: "Texturing",
    classes: TEX_COORD,
    build: |init, _| {
        init.string_field("mode", "SPHERE");
        NodeKind::TextureCoordinateGenerator
    },
};

/// Which parent-side notification a property node raises when its data
/// field changes.
pub(crate) fn property_notification(kind: &NodeKind) -> Option<&'static str> {
    match kind {
        NodeKind::Coordinate => Some("coord"),
        NodeKind::Normal => Some("normal"),
        NodeKind::Color | NodeKind::ColorRgba => Some("color"),
        NodeKind::TextureCoordinate | NodeKind::TextureCoordinateGenerator => Some("texCoord"),
        _ => None,
    }
}

struct Gathered {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    colors: Vec<Vec4>,
    tex_mode: TexGenMode,
}

fn gather_properties(graph: &SceneGraph, id: NodeId) -> Gathered {
    let mut out = Gathered {
        positions: Vec::new(),
        normals: Vec::new(),
        tex_coords: Vec::new(),
        colors: Vec::new(),
        tex_mode: TexGenMode::default(),
    };
    let Some(node) = graph.node(id) else {
        return out;
    };
    if let Some(coord) = node.child_in_slot("coord").and_then(|c| graph.node(c)) {
        out.positions = coord.vec3s_field("point").to_vec();
    }
    if let Some(normal) = node.child_in_slot("normal").and_then(|c| graph.node(c)) {
        out.normals = normal.vec3s_field("vector").to_vec();
    }
    if let Some(tc) = node.child_in_slot("texCoord").and_then(|c| graph.node(c)) {
        // A generator selects a synthesis mode instead of supplying points.
        match tc.kind {
            NodeKind::TextureCoordinateGenerator => {
                out.tex_mode = TexGenMode::from_name(tc.str_field("mode"));
            }
            _ => out.tex_coords = tc.vec2s_field("point").to_vec(),
        }
    }
    if let Some(color) = node.child_in_slot("color").and_then(|c| graph.node(c)) {
        out.colors = match color.kind {
            NodeKind::ColorRgba => color.vec4s_field("color").to_vec(),
            _ => color
                .vec3s_field("color")
                .iter()
                .map(|c| c.extend(1.0))
                .collect(),
        };
    }
    out
}

/// Rebuild a composed geometry's mesh from its fields and property children,
/// then flag the owning shapes for re-upload.
pub(crate) fn rebuild_geometry(graph: &mut SceneGraph, id: NodeId) {
    let data = gather_properties(graph, id);
    let Some(node) = graph.node(id) else {
        return;
    };

    let mesh = match &node.kind {
        NodeKind::IndexedFaceSet(_) => build_indexed_faces(&IndexedFaceInput {
            positions: &data.positions,
            normals: &data.normals,
            tex_coords: &data.tex_coords,
            colors: &data.colors,
            coord_index: node.ints_field("coordIndex"),
            normal_index: node.ints_field("normalIndex"),
            tex_coord_index: node.ints_field("texCoordIndex"),
            color_index: node.ints_field("colorIndex"),
            normal_per_vertex: node.bool_field("normalPerVertex"),
            color_per_vertex: node.bool_field("colorPerVertex"),
            crease_angle: node.float_field("creaseAngle"),
            tex_mode: data.tex_mode,
        }),
        NodeKind::IndexedTriangleSet(_) => {
            // Triples to -1-terminated faces, then the shared face path.
            let mut coord_index = Vec::new();
            for tri in node.ints_field("index").chunks_exact(3) {
                coord_index.extend_from_slice(tri);
                coord_index.push(-1);
            }
            let smooth = node.bool_field("normalPerVertex");
            build_indexed_faces(&IndexedFaceInput {
                positions: &data.positions,
                normals: &data.normals,
                tex_coords: &data.tex_coords,
                colors: &data.colors,
                coord_index: &coord_index,
                color_per_vertex: node.bool_field("colorPerVertex"),
                crease_angle: if smooth { std::f32::consts::PI } else { 0.0 },
                tex_mode: data.tex_mode,
                ..Default::default()
            })
        }
        NodeKind::IndexedLineSet(_) => build_indexed_lines(&IndexedLineInput {
            positions: &data.positions,
            colors: &data.colors,
            coord_index: node.ints_field("coordIndex"),
            color_index: node.ints_field("colorIndex"),
            color_per_vertex: node.bool_field("colorPerVertex"),
        }),
        NodeKind::PointSet(_) => build_point_cloud(&data.positions, &data.colors),
        _ => return,
    };

    if let Some(geom) = graph.node_mut(id).and_then(|n| n.kind.geom_mut()) {
        geom.mesh = Arc::new(mesh);
    }
    shape::dirty_parent_shapes(graph, id);
}
