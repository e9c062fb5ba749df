//! Shape, appearance, and material nodes.

use glam::Vec3;
use tracing::error;

use crate::graph::SceneGraph;
use crate::mesh::GeometryCache;
use crate::node::{NodeClass, NodeId, NodeInit};
use crate::registry::NodeDescriptor;

use super::{NodeKind, ShapeState, APPEARANCE, MATERIAL, SHAPE};

pub const SHAPE_NODE: NodeDescriptor = NodeDescriptor {
    name: "Shape",
    component: "Shape",
    classes: SHAPE,
    build: build_shape,
};

fn build_shape(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    init.bool_field("render", true);
    init.bool_field("isPickable", true);
    init.single("appearance", NodeClass::Appearance);
    init.single("geometry", NodeClass::Geometry);
    NodeKind::Shape(ShapeState {
        geometry_dirty: true,
        material_dirty: true,
        ..ShapeState::default()
    })
}

pub const APPEARANCE_NODE: NodeDescriptor = NodeDescriptor {
    name: "Appearance",
    component: "Shape",
    classes: APPEARANCE,
    build: build_appearance,
};

fn build_appearance(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    init.single("material", NodeClass::Material);
    NodeKind::Appearance
}

pub const MATERIAL_NODE: NodeDescriptor = NodeDescriptor {
    name: "Material",
    component: "Shape",
    classes: MATERIAL,
    build: build_material,
};

fn build_material(init: &mut NodeInit, _cache: &mut GeometryCache) -> NodeKind {
    init.float_field("ambientIntensity", 0.2);
    init.color_field("diffuseColor", Vec3::splat(0.8));
    init.color_field("emissiveColor", Vec3::ZERO);
    init.float_field("shininess", 0.2);
    init.color_field("specularColor", Vec3::ZERO);
    init.float_field("transparency", 0.0);
    NodeKind::Material
}

/// Shape setup completion: a shape without an appearance gets a default one,
/// a shape without geometry is reported (it can never render).
pub(crate) fn shape_node_changed(graph: &mut SceneGraph, id: NodeId) {
    let (has_appearance, has_geometry, def_name) = match graph.node(id) {
        Some(node) => (
            node.child_in_slot("appearance").is_some(),
            node.child_in_slot("geometry").is_some(),
            node.def_name.clone().unwrap_or_default(),
        ),
        None => return,
    };
    if !has_appearance {
        if let Some(app) = graph.create_default_node("Appearance") {
            graph.add_child(id, app, Some("appearance"));
            appearance_node_changed(graph, app);
        }
    }
    if !has_geometry {
        error!(shape = %def_name, "no geometry given in shape");
    }
}

/// Appearance setup completion: synthesize a default material when absent.
pub(crate) fn appearance_node_changed(graph: &mut SceneGraph, id: NodeId) {
    let missing = graph
        .node(id)
        .map(|node| node.child_in_slot("material").is_none())
        .unwrap_or(false);
    if missing {
        if let Some(mat) = graph.create_default_node("Material") {
            graph.add_child(id, mat, Some("material"));
        }
    }
}

/// Material edits dirty every shape above the owning appearance.
pub(crate) fn material_field_changed(graph: &mut SceneGraph, id: NodeId) {
    let appearances: Vec<NodeId> = match graph.node(id) {
        Some(node) => node.parents().to_vec(),
        None => return,
    };
    for app in appearances {
        let shapes: Vec<NodeId> = match graph.node(app) {
            Some(node) => node.parents().to_vec(),
            None => continue,
        };
        for shape in shapes {
            if let Some(state) = graph.node_mut(shape).and_then(|n| n.kind.shape_mut()) {
                state.material_dirty = true;
            }
        }
    }
}

/// Mark the shapes directly above a geometry or property node as needing a
/// geometry re-upload.
pub(crate) fn dirty_parent_shapes(graph: &mut SceneGraph, geometry: NodeId) {
    let parents: Vec<NodeId> = match graph.node(geometry) {
        Some(node) => node.parents().to_vec(),
        None => return,
    };
    for parent in parents {
        if let Some(state) = graph.node_mut(parent).and_then(|n| n.kind.shape_mut()) {
            state.geometry_dirty = true;
        }
    }
}

/// Last-parent teardown: retire renderer resources and release the pick id.
/// Runs at most once because the handle and id are taken out of the state.
pub(crate) fn shape_parent_removed(graph: &mut SceneGraph, id: NodeId) {
    let orphaned = graph
        .node(id)
        .map(|node| node.parents().is_empty())
        .unwrap_or(false);
    if !orphaned {
        return;
    }
    let (handle, pick_id) = match graph.node_mut(id).and_then(|n| n.kind.shape_mut()) {
        Some(state) => (state.render_handle.take(), state.pick_id.take()),
        None => return,
    };
    if let Some(handle) = handle {
        graph.retire_render_handle(handle);
    }
    if let Some(pick_id) = pick_id {
        graph.release_pick_id(pick_id);
    }
}
