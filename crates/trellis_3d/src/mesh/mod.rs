//! Mesh assembly: buffers, procedural primitives, indexed-geometry
//! flattening, and the shared geometry cache.

mod cache;
mod indexed;
mod primitives;

pub use cache::{CacheStats, GeometryCache};
pub use indexed::{
    build_indexed_faces, build_indexed_lines, build_point_cloud, calc_normals, calc_tex_coords,
    IndexedFaceInput, IndexedLineInput, TexGenMode, MAX_PART_VERTICES,
};
pub use primitives::{BoxGeometry, ConeGeometry, CylinderGeometry, SphereGeometry, TorusGeometry};

use glam::{Vec2, Vec3, Vec4};
use rustc_hash::FxHashMap;

use crate::math::BoundingBox;

/// How the index buffer of a part is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Triangles,
    Lines,
    Points,
}

/// One renderable chunk: parallel attribute buffers plus an index buffer.
///
/// All attribute buffers that are non-empty have the same length; indices
/// stay below [`MAX_PART_VERTICES`] so they fit 16-bit index buffers.
#[derive(Clone, Debug, Default)]
pub struct MeshPart {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tex_coords: Vec<Vec2>,
    pub colors: Vec<Vec4>,
    pub indices: Vec<u32>,
}

impl MeshPart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Flat f32 view of the positions, for buffer upload.
    pub fn positions_raw(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Flat f32 view of the normals.
    pub fn normals_raw(&self) -> &[f32] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Flat f32 view of the texture coordinates.
    pub fn tex_coords_raw(&self) -> &[f32] {
        bytemuck::cast_slice(&self.tex_coords)
    }

    /// Flat f32 view of the RGBA colors.
    pub fn colors_raw(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }
}

/// Extra per-vertex data beyond the fixed attribute set.
#[derive(Clone, Debug)]
pub struct DynamicAttribute {
    pub components: u32,
    pub data: Vec<f32>,
}

/// Assembled geometry, shared by reference between nodes.
///
/// A mesh is immutable once published behind an `Arc`; any change to the
/// generating fields produces a new mesh. Bounds and counts are computed by
/// [`Mesh::finished`] after the parts are filled in.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub parts: Vec<MeshPart>,
    pub attributes: FxHashMap<String, DynamicAttribute>,
    pub primitive: Primitive,
    /// False for geometry that ignores lighting (point clouds).
    pub lit: bool,
    bounds: BoundingBox,
    vertex_count: usize,
    face_count: usize,
}

impl Mesh {
    /// An empty mesh of the given primitive type.
    pub fn empty(primitive: Primitive) -> Self {
        Self {
            parts: Vec::new(),
            attributes: FxHashMap::default(),
            primitive,
            lit: true,
            bounds: BoundingBox::EMPTY,
            vertex_count: 0,
            face_count: 0,
        }
    }

    /// Recompute cached bounds and counts, consuming the builder.
    pub fn finished(mut self) -> Self {
        let mut bounds = BoundingBox::EMPTY;
        let mut vertex_count = 0;
        let mut face_count = 0;
        for part in &self.parts {
            for p in &part.positions {
                bounds.expand_to_include(*p);
            }
            vertex_count += part.positions.len();
            face_count += match self.primitive {
                Primitive::Triangles => part.indices.len() / 3,
                Primitive::Lines => part.indices.len() / 2,
                Primitive::Points => part.positions.len(),
            };
        }
        self.bounds = bounds;
        self.vertex_count = vertex_count;
        self.face_count = face_count;
        self
    }

    /// Cached bounding box over all parts.
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Total vertex count over all parts.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Total face (triangle/segment/point) count over all parts.
    pub fn face_count(&self) -> usize {
        self.face_count
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }
}
