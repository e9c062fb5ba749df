//! Concrete node kinds and their registration roster.
//!
//! Per-kind state lives in the [`NodeKind`] variants; field defaults and
//! child slots are declared by each kind's build function; behavior is
//! dispatched by `match` from the graph-level operations.

pub mod bindable;
pub mod composed;
pub mod core;
pub mod geometry;
pub mod grouping;
pub mod shape;

use std::sync::Arc;

use glam::Mat4;

use crate::mesh::Mesh;
use crate::node::NodeClass;
use crate::registry::NodeTypeRegistry;

/// Opaque handle to renderer-owned resources attached to a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u64);

/// Derived state of transform-bearing nodes.
#[derive(Clone, Debug)]
pub struct TransformState {
    /// Local matrix, recomputed whenever a transform field changes.
    pub matrix: Mat4,
}

/// Derived state of shape nodes.
#[derive(Clone, Debug, Default)]
pub struct ShapeState {
    /// Geometry buffers need (re)upload.
    pub geometry_dirty: bool,
    /// Appearance/material uniforms need refresh.
    pub material_dirty: bool,
    /// Id registered in the graph's pick map once the shape is drawable.
    pub pick_id: Option<u32>,
    /// Renderer resources; retired when the last parent goes away.
    pub render_handle: Option<RenderHandle>,
}

/// Derived state of geometry nodes.
#[derive(Clone, Debug)]
pub struct GeomState {
    pub mesh: Arc<Mesh>,
    /// Whether rays may hit this geometry.
    pub pickable: bool,
}

/// The closed set of node kinds.
pub enum NodeKind {
    SceneRoot,
    Group,
    Switch,
    Transform(TransformState),
    MatrixTransform(TransformState),
    WorldInfo,
    Field,
    MetadataDouble,
    MetadataFloat,
    MetadataInteger,
    MetadataString,
    MetadataSet,
    Shape(ShapeState),
    Appearance,
    Material,
    Viewpoint,
    NavigationInfo,
    Background,
    Fog,
    Box(GeomState),
    Sphere(GeomState),
    Cone(GeomState),
    Cylinder(GeomState),
    Torus(GeomState),
    IndexedFaceSet(GeomState),
    IndexedTriangleSet(GeomState),
    IndexedLineSet(GeomState),
    PointSet(GeomState),
    Coordinate,
    Normal,
    Color,
    ColorRgba,
    TextureCoordinate,
    TextureCoordinateGenerator,
}

impl NodeKind {
    /// Geometry state, for any geometry kind.
    pub fn geom(&self) -> Option<&GeomState> {
        match self {
            NodeKind::Box(g)
            | NodeKind::Sphere(g)
            | NodeKind::Cone(g)
            | NodeKind::Cylinder(g)
            | NodeKind::Torus(g)
            | NodeKind::IndexedFaceSet(g)
            | NodeKind::IndexedTriangleSet(g)
            | NodeKind::IndexedLineSet(g)
            | NodeKind::PointSet(g) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn geom_mut(&mut self) -> Option<&mut GeomState> {
        match self {
            NodeKind::Box(g)
            | NodeKind::Sphere(g)
            | NodeKind::Cone(g)
            | NodeKind::Cylinder(g)
            | NodeKind::Torus(g)
            | NodeKind::IndexedFaceSet(g)
            | NodeKind::IndexedTriangleSet(g)
            | NodeKind::IndexedLineSet(g)
            | NodeKind::PointSet(g) => Some(g),
            _ => None,
        }
    }

    /// Shape state, for shape nodes.
    pub fn shape(&self) -> Option<&ShapeState> {
        match self {
            NodeKind::Shape(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn shape_mut(&mut self) -> Option<&mut ShapeState> {
        match self {
            NodeKind::Shape(s) => Some(s),
            _ => None,
        }
    }

    /// Local transform matrix; identity for non-transform nodes.
    pub fn local_matrix(&self) -> Mat4 {
        match self {
            NodeKind::Transform(t) | NodeKind::MatrixTransform(t) => t.matrix,
            _ => Mat4::IDENTITY,
        }
    }
}

// Class lists, most general first.
pub(crate) const CHILD: &[NodeClass] = &[NodeClass::Node, NodeClass::Child];
pub(crate) const GROUPING: &[NodeClass] =
    &[NodeClass::Node, NodeClass::Child, NodeClass::Grouping];
pub(crate) const TRANSFORM: &[NodeClass] = &[
    NodeClass::Node,
    NodeClass::Child,
    NodeClass::Grouping,
    NodeClass::Transform,
];
pub(crate) const SHAPE: &[NodeClass] = &[NodeClass::Node, NodeClass::Child, NodeClass::Shape];
pub(crate) const GEOMETRY: &[NodeClass] = &[NodeClass::Node, NodeClass::Geometry];
pub(crate) const APPEARANCE: &[NodeClass] = &[NodeClass::Node, NodeClass::Appearance];
pub(crate) const MATERIAL: &[NodeClass] = &[NodeClass::Node, NodeClass::Material];
pub(crate) const BINDABLE: &[NodeClass] =
    &[NodeClass::Node, NodeClass::Child, NodeClass::Bindable];
pub(crate) const METADATA: &[NodeClass] = &[NodeClass::Node, NodeClass::Metadata];
pub(crate) const COORDINATE: &[NodeClass] = &[
    NodeClass::Node,
    NodeClass::GeometricProperty,
    NodeClass::Coordinate,
];
pub(crate) const NORMAL: &[NodeClass] = &[
    NodeClass::Node,
    NodeClass::GeometricProperty,
    NodeClass::Normal,
];
pub(crate) const COLOR: &[NodeClass] = &[
    NodeClass::Node,
    NodeClass::GeometricProperty,
    NodeClass::Color,
];
pub(crate) const TEX_COORD: &[NodeClass] = &[
    NodeClass::Node,
    NodeClass::GeometricProperty,
    NodeClass::TextureCoordinate,
];

/// Register every standard node type.
pub fn register_standard_nodes(registry: &mut NodeTypeRegistry) {
    // Core and grouping
    registry.register(core::SCENE);
    registry.register(core::GROUP);
    registry.register(core::SWITCH);
    registry.register(core::FIELD_NODE);
    registry.register(core::WORLD_INFO);
    registry.register(core::METADATA_DOUBLE);
    registry.register(core::METADATA_FLOAT);
    registry.register(core::METADATA_INTEGER);
    registry.register(core::METADATA_STRING);
    registry.register(core::METADATA_SET);
    registry.register(grouping::TRANSFORM_NODE);
    registry.register(grouping::MATRIX_TRANSFORM);

    // Shape and appearance
    registry.register(shape::SHAPE_NODE);
    registry.register(shape::APPEARANCE_NODE);
    registry.register(shape::MATERIAL_NODE);

    // Bindables
    registry.register(bindable::VIEWPOINT);
    registry.register(bindable::NAVIGATION_INFO);
    registry.register(bindable::BACKGROUND);
    registry.register(bindable::FOG);

    // Primitive geometry
    registry.register(geometry::BOX);
    registry.register(geometry::SPHERE);
    registry.register(geometry::CONE);
    registry.register(geometry::CYLINDER);
    registry.register(geometry::TORUS);

    // Composed geometry and properties
    registry.register(composed::INDEXED_FACE_SET);
    registry.register(composed::INDEXED_TRIANGLE_SET);
    registry.register(composed::INDEXED_LINE_SET);
    registry.register(composed::POINT_SET);
    registry.register(composed::COORDINATE_NODE);
    registry.register(composed::NORMAL_NODE);
    registry.register(composed::COLOR_NODE);
    registry.register(composed::COLOR_RGBA_NODE);
    registry.register(composed::TEXTURE_COORDINATE);
    registry.register(composed::TEXTURE_COORDINATE_GENERATOR);
}
